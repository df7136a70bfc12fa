//! Script-backed [`DomSurface`] implementation.
//!
//! Elements are addressed by tagging each query match with a fresh
//! `data-clubpilot-handle` token and handing back the attribute selector as
//! the handle. The page owns the nodes; a handle is just a selector that
//! resolves while the tagged node is still rendered and reports stale
//! otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use cdp_channel::PageChannel;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::DomError;
use crate::surface::{DomSurface, ElementHandle};

const HANDLE_ATTR: &str = "data-clubpilot-handle";

pub struct ScriptDom {
    channel: Arc<dyn PageChannel>,
}

impl ScriptDom {
    pub fn new(channel: Arc<dyn PageChannel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<dyn PageChannel> {
        &self.channel
    }

    async fn run(&self, script: String, context: &str) -> Result<Value, DomError> {
        let value = self.channel.execute(&script).await?;
        let status = value
            .get("status")
            .and_then(|s| s.as_str())
            .ok_or_else(|| DomError::Protocol(format!("{context}: missing status field")))?;

        match status {
            "ok" => Ok(value),
            "stale" => Err(DomError::StaleHandle(context.to_string())),
            other => Err(DomError::Protocol(format!(
                "{context}: unexpected status {other}"
            ))),
        }
    }

    fn parse_handles(value: &Value, context: &str) -> Result<Vec<ElementHandle>, DomError> {
        value
            .get("handles")
            .and_then(|h| h.as_array())
            .map(|handles| {
                handles
                    .iter()
                    .filter_map(|h| h.as_str())
                    .map(|h| ElementHandle(h.to_string()))
                    .collect()
            })
            .ok_or_else(|| DomError::Protocol(format!("{context}: missing handles array")))
    }

    /// Emits JS that tags every element in a `nodes` array with a fresh
    /// token and collects the attribute selectors into `handles`.
    fn tag_script() -> String {
        let prefix = format!("h-{}", Uuid::new_v4().simple());
        format!(
            r#"const attr = {attr};
                const prefix = {prefix};
                const handles = nodes.map((el, i) => {{
                    const token = prefix + '-' + i;
                    el.setAttribute(attr, token);
                    return '[' + attr + '="' + token + '"]';
                }});"#,
            attr = json_str(HANDLE_ATTR),
            prefix = json_str(&prefix),
        )
    }
}

fn json_str(value: &str) -> String {
    Value::from(value).to_string()
}

#[async_trait]
impl DomSurface for ScriptDom {
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
        let script = format!(
            r#"(() => {{
                const nodes = Array.from(document.querySelectorAll({selector}));
                {tag}
                return {{ status: 'ok', handles: handles }};
            }})()"#,
            selector = json_str(selector),
            tag = Self::tag_script(),
        );
        let value = self.run(script, selector).await?;
        Self::parse_handles(&value, selector)
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, DomError> {
        let script = format!(
            r#"(() => {{
                const root = document.querySelector({scope});
                if (!root) return {{ status: 'stale' }};
                const nodes = Array.from(root.querySelectorAll({selector}));
                {tag}
                return {{ status: 'ok', handles: handles }};
            }})()"#,
            scope = json_str(scope.selector()),
            selector = json_str(selector),
            tag = Self::tag_script(),
        );
        let value = self.run(script, scope.selector()).await?;
        Self::parse_handles(&value, selector)
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                return {{ status: 'ok', value: (el.innerText || el.textContent || '').trim() }};
            }})()"#,
            handle = json_str(handle.selector()),
        );
        let value = self.run(script, handle.selector()).await?;
        Ok(value
            .get("value")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                return {{ status: 'ok', value: el.getAttribute({name}) }};
            }})()"#,
            handle = json_str(handle.selector()),
            name = json_str(name),
        );
        let value = self.run(script, handle.selector()).await?;
        Ok(value
            .get("value")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool, DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                const style = window.getComputedStyle(el);
                if (style.visibility === 'hidden' || style.display === 'none') {{
                    return {{ status: 'ok', value: false }};
                }}
                const rect = el.getBoundingClientRect();
                const visible = rect.width > 0 || rect.height > 0 || el.getClientRects().length > 0;
                return {{ status: 'ok', value: visible }};
            }})()"#,
            handle = json_str(handle.selector()),
        );
        let value = self.run(script, handle.selector()).await?;
        Ok(value.get("value").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool, DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                const disabled = el.disabled === true
                    || (el.className || '').split(/\s+/).indexOf('disabled') !== -1;
                return {{ status: 'ok', value: !disabled }};
            }})()"#,
            handle = json_str(handle.selector()),
        );
        let value = self.run(script, handle.selector()).await?;
        Ok(value.get("value").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                el.click();
                return {{ status: 'ok' }};
            }})()"#,
            handle = json_str(handle.selector()),
        );
        self.run(script, handle.selector()).await?;
        Ok(())
    }

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), DomError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({handle});
                if (!el) return {{ status: 'stale' }};
                el.focus();
                el.value = {text};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ status: 'ok' }};
            }})()"#,
            handle = json_str(handle.selector()),
            text = json_str(text),
        );
        self.run(script, handle.selector()).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DomError> {
        Ok(self.channel.current_url().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_channel::ChannelError;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Channel that records scripts and answers from a canned queue.
    struct ScriptedChannel {
        scripts: Mutex<Vec<String>>,
        responses: Mutex<Vec<Value>>,
    }

    impl ScriptedChannel {
        fn new(responses: Vec<Value>) -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl PageChannel for ScriptedChannel {
        async fn execute(&self, script: &str) -> Result<Value, ChannelError> {
            self.scripts.lock().await.push(script.to_string());
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                return Err(ChannelError::Internal("no scripted response left".into()));
            }
            Ok(responses.remove(0))
        }

        async fn execute_async(&self, script: &str) -> Result<Value, ChannelError> {
            self.execute(script).await
        }

        async fn navigate(&self, _url: &str) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn current_url(&self) -> Result<String, ChannelError> {
            Ok("https://companion.example/app".to_string())
        }
    }

    #[tokio::test]
    async fn query_returns_tagged_handles() {
        let channel = Arc::new(ScriptedChannel::new(vec![json!({
            "status": "ok",
            "handles": ["[data-clubpilot-handle=\"h-abc-0\"]", "[data-clubpilot-handle=\"h-abc-1\"]"],
        })]));
        let dom = ScriptDom::new(channel.clone());

        let handles = dom.query("button.btn-standard").await.unwrap();
        assert_eq!(handles.len(), 2);
        assert!(handles[0].selector().contains(HANDLE_ATTR));

        let scripts = channel.scripts.lock().await;
        assert!(scripts[0].contains("button.btn-standard"));
        assert!(scripts[0].contains(HANDLE_ATTR));
    }

    #[tokio::test]
    async fn stale_status_maps_to_stale_handle() {
        let channel = Arc::new(ScriptedChannel::new(vec![json!({ "status": "stale" })]));
        let dom = ScriptDom::new(channel);

        let handle = ElementHandle("[data-clubpilot-handle=\"h-gone-0\"]".into());
        let err = dom.text(&handle).await.unwrap_err();
        assert!(matches!(err, DomError::StaleHandle(_)));
    }

    #[tokio::test]
    async fn missing_status_is_a_protocol_error() {
        let channel = Arc::new(ScriptedChannel::new(vec![json!({ "value": 1 })]));
        let dom = ScriptDom::new(channel);

        let err = dom.query("div").await.unwrap_err();
        assert!(matches!(err, DomError::Protocol(_)));
    }
}
