//! Page-scoped script execution on top of the command transport.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::transport::{CdpTransport, CommandTarget};

/// The remote execution channel the rest of the system is written against.
///
/// `execute` runs a plain expression; `execute_async` additionally awaits a
/// promise-valued expression before returning its settled value. Neither
/// guarantees that page state survives a reload; callers that cache
/// anything derived from page state must re-verify it after navigation.
#[async_trait]
pub trait PageChannel: Send + Sync {
    async fn execute(&self, script: &str) -> Result<Value, ChannelError>;

    async fn execute_async(&self, script: &str) -> Result<Value, ChannelError>;

    async fn navigate(&self, url: &str) -> Result<(), ChannelError>;

    async fn current_url(&self) -> Result<String, ChannelError>;
}

/// CDP-backed channel bound to a single page target.
///
/// The first call finds (or creates) a page target and attaches a flattened
/// session; the session is re-established transparently when a command fails
/// at the transport level.
pub struct CdpChannel {
    transport: Arc<dyn CdpTransport>,
    started: tokio::sync::OnceCell<()>,
    session: tokio::sync::Mutex<Option<String>>,
}

impl CdpChannel {
    pub fn new(transport: Arc<dyn CdpTransport>) -> Self {
        Self {
            transport,
            started: tokio::sync::OnceCell::new(),
            session: tokio::sync::Mutex::new(None),
        }
    }

    async fn ensure_session(&self) -> Result<String, ChannelError> {
        self.started
            .get_or_try_init(|| async { self.transport.start().await })
            .await?;

        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let session = self.attach_to_page().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn attach_to_page(&self) -> Result<String, ChannelError> {
        let targets = self
            .transport
            .send_command(CommandTarget::Browser, "Target.getTargets", json!({}))
            .await?;

        let target_id = targets
            .get("targetInfos")
            .and_then(|v| v.as_array())
            .and_then(|infos| {
                infos.iter().find(|info| {
                    info.get("type").and_then(|t| t.as_str()) == Some("page")
                        && !info
                            .get("url")
                            .and_then(|u| u.as_str())
                            .unwrap_or_default()
                            .starts_with("devtools://")
                })
            })
            .and_then(|info| info.get("targetId"))
            .and_then(|id| id.as_str())
            .map(|id| id.to_string());

        let target_id = match target_id {
            Some(id) => id,
            None => {
                debug!(target: "cdp-channel", "no page target found, creating one");
                let created = self
                    .transport
                    .send_command(
                        CommandTarget::Browser,
                        "Target.createTarget",
                        json!({ "url": "about:blank" }),
                    )
                    .await?;
                created
                    .get("targetId")
                    .and_then(|id| id.as_str())
                    .map(|id| id.to_string())
                    .ok_or_else(|| {
                        ChannelError::Internal("Target.createTarget returned no targetId".into())
                    })?
            }
        };

        let attached = self
            .transport
            .send_command(
                CommandTarget::Browser,
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
            )
            .await?;

        attached
            .get("sessionId")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| {
                ChannelError::Internal("Target.attachToTarget returned no sessionId".into())
            })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<Value, ChannelError> {
        let session = self.ensure_session().await?;

        let outcome = self
            .transport
            .send_command(
                CommandTarget::Session(session),
                "Runtime.evaluate",
                json!({
                    "expression": script,
                    "returnByValue": true,
                    "awaitPromise": await_promise,
                }),
            )
            .await;

        let payload = match outcome {
            Ok(payload) => payload,
            Err(err) => {
                // A dead session stays dead; drop it so the next call
                // re-attaches instead of failing the same way forever.
                if matches!(err, ChannelError::CdpIo(_)) {
                    warn!(target: "cdp-channel", %err, "command failed, dropping session");
                    self.session.lock().await.take();
                }
                return Err(err);
            }
        };

        if let Some(details) = payload.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .or_else(|| details.get("text").and_then(|t| t.as_str()))
                .unwrap_or("unknown script exception");
            return Err(ChannelError::ScriptException(text.to_string()));
        }

        Ok(payload
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PageChannel for CdpChannel {
    async fn execute(&self, script: &str) -> Result<Value, ChannelError> {
        self.evaluate(script, false).await
    }

    async fn execute_async(&self, script: &str) -> Result<Value, ChannelError> {
        self.evaluate(script, true).await
    }

    async fn navigate(&self, url: &str) -> Result<(), ChannelError> {
        let session = self.ensure_session().await?;
        self.transport
            .send_command(
                CommandTarget::Session(session),
                "Page.navigate",
                json!({ "url": url }),
            )
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ChannelError> {
        let value = self.evaluate("window.location.href", false).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ChannelError::Internal("location.href was not a string".into()))
    }
}
