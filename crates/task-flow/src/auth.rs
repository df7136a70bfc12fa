//! Login flow for the companion app.
//!
//! The provider uses a two-step form (email, then password, same submit
//! button) with an occasional second-factor screen. A missing second-factor
//! form simply means it was not required this time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdp_channel::PageChannel;
use dom_kit::{with_retry, DomError, RetryOptions};
use tracing::{debug, info};

use crate::context::SolveCtx;
use crate::errors::PilotError;

pub const APP_URL: &str = "https://www.ea.com/fifa/ultimate-team/web-app/";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Source of the one-time code when the second-factor screen shows up.
#[async_trait]
pub trait SecondFactorSource: Send + Sync {
    async fn code(&self) -> Result<String, PilotError>;
}

pub struct LoginRoutine {
    ctx: SolveCtx,
    channel: Arc<dyn PageChannel>,
    app_url: String,
}

impl LoginRoutine {
    pub fn new(ctx: SolveCtx, channel: Arc<dyn PageChannel>) -> Self {
        Self {
            ctx,
            channel,
            app_url: APP_URL.to_string(),
        }
    }

    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    pub async fn is_logged_in(&self) -> Result<bool, PilotError> {
        let tab_bar = &self.ctx.selectors.navigation.tab_bar;
        match self.ctx.waits.wait_for_element(tab_bar, None).await {
            Ok(_) => Ok(true),
            Err(DomError::WaitTimeout { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Navigate to the app and log in; a session that is already live is
    /// left alone.
    pub async fn login(
        &self,
        credentials: &Credentials,
        second_factor: Option<&dyn SecondFactorSource>,
    ) -> Result<(), PilotError> {
        self.channel.navigate(&self.app_url).await?;
        // The app takes a while to boot before rendering anything.
        self.ctx.waits.sleep(5000).await;

        if self.is_logged_in().await? {
            info!(target: "task_flow", "already logged in");
            return Ok(());
        }

        self.show_login_form().await;
        self.submit_credentials(credentials).await?;
        self.handle_second_factor(second_factor).await?;

        let tab_bar = self.ctx.selectors.navigation.tab_bar.clone();
        self.ctx
            .waits
            .wait_for_element(&tab_bar, Some(Duration::from_secs(15)))
            .await
            .map_err(|_| PilotError::LoginFailed)?;
        info!(target: "task_flow", "login verified");
        Ok(())
    }

    /// Login with bounded retries; transient page weirdness is the norm on
    /// this provider.
    pub async fn login_with_retry(
        &self,
        credentials: &Credentials,
        second_factor: Option<&dyn SecondFactorSource>,
    ) -> Result<(), PilotError> {
        let opts = RetryOptions {
            initial_delay: Duration::from_secs(2),
            ..RetryOptions::default()
        };
        with_retry(|| self.login(credentials, second_factor), opts)
            .await
            .map_err(PilotError::from)
    }

    /// Some sessions land directly on the form; the reveal button is
    /// best-effort.
    async fn show_login_form(&self) {
        let login = self.ctx.selectors.login.clone();
        let content = match self.ctx.waits.wait_for_element(&login.login_content, None).await {
            Ok(content) => content,
            Err(_) => return,
        };
        let buttons = match self
            .ctx
            .dom
            .query_within(&content, &login.show_login_button)
            .await
        {
            Ok(buttons) => buttons,
            Err(_) => return,
        };
        if let Some(button) = buttons.first() {
            if self.ctx.dom.click(button).await.is_ok() {
                self.ctx.waits.sleep(2000).await;
            }
        }
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), PilotError> {
        let login = self.ctx.selectors.login.clone();

        let email = self.ctx.waits.wait_for_clickable(&login.email_input, None).await?;
        self.ctx.dom.type_text(&email, &credentials.email).await?;
        let submit = self.ctx.waits.wait_for_clickable(&login.submit_button, None).await?;
        self.ctx.dom.click(&submit).await?;

        self.ctx.waits.sleep(2000).await;
        self.wait_for_loading_complete().await?;

        let password = self
            .ctx
            .waits
            .wait_for_clickable(&login.password_input, None)
            .await?;
        self.ctx.dom.type_text(&password, &credentials.password).await?;
        let submit = self.ctx.waits.wait_for_clickable(&login.submit_button, None).await?;
        self.ctx.dom.click(&submit).await?;

        self.ctx.waits.sleep(3000).await;
        self.wait_for_loading_complete().await?;
        Ok(())
    }

    async fn handle_second_factor(
        &self,
        source: Option<&dyn SecondFactorSource>,
    ) -> Result<(), PilotError> {
        let two_factor = self.ctx.selectors.two_factor.clone();
        let form = self
            .ctx
            .waits
            .wait_for_element(&two_factor.verification_form, Some(Duration::from_secs(5)))
            .await;

        match form {
            Err(DomError::WaitTimeout { .. }) => {
                debug!(target: "task_flow", "no second factor requested");
                Ok(())
            }
            Err(err) => Err(err.into()),
            Ok(_) => {
                let source = source.ok_or(PilotError::LoginFailed)?;
                let code = source.code().await?;

                let input = self
                    .ctx
                    .waits
                    .wait_for_clickable(&two_factor.code_input, None)
                    .await?;
                self.ctx.dom.type_text(&input, &code).await?;
                let submit = self
                    .ctx
                    .waits
                    .wait_for_clickable(&two_factor.submit_button, None)
                    .await?;
                self.ctx.dom.click(&submit).await?;
                self.ctx.waits.sleep(2000).await;
                Ok(())
            }
        }
    }

    async fn wait_for_loading_complete(&self) -> Result<(), PilotError> {
        let shield = self.ctx.selectors.loading.click_shield.clone();
        let dom = self.ctx.dom.clone();

        self.ctx
            .waits
            .wait_until(
                "login loading shield gone",
                Some(Duration::from_secs(30)),
                || {
                    let dom = dom.clone();
                    let shield = shield.clone();
                    async move {
                        let shields = dom.query(&shield).await?;
                        for handle in &shields {
                            if dom.is_displayed(handle).await.unwrap_or(false) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Selectors;
    use crate::testkit::FakeDom;
    use cdp_channel::ChannelError;
    use serde_json::Value;
    use std::sync::Mutex;

    struct FakeChannel {
        navigations: Mutex<Vec<String>>,
    }

    impl FakeChannel {
        fn new() -> Self {
            Self {
                navigations: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageChannel for FakeChannel {
        async fn execute(&self, _script: &str) -> Result<Value, ChannelError> {
            Ok(Value::Null)
        }

        async fn execute_async(&self, _script: &str) -> Result<Value, ChannelError> {
            Ok(Value::Null)
        }

        async fn navigate(&self, url: &str) -> Result<(), ChannelError> {
            self.navigations.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn current_url(&self) -> Result<String, ChannelError> {
            Ok(APP_URL.to_string())
        }
    }

    fn routine(dom: Arc<FakeDom>, channel: Arc<FakeChannel>) -> LoginRoutine {
        LoginRoutine::new(
            SolveCtx::new(dom, Arc::new(Selectors::default())),
            channel,
        )
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "pilot@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn live_session_skips_the_form() {
        let dom = Arc::new(FakeDom::new());
        dom.add_node(".ut-tab-bar");
        let channel = Arc::new(FakeChannel::new());

        routine(dom.clone(), channel.clone())
            .login(&credentials(), None)
            .await
            .unwrap();

        assert_eq!(channel.navigations.lock().unwrap().len(), 1);
        assert!(dom.typed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn credentials_are_typed_then_submitted_twice() {
        let dom = Arc::new(FakeDom::new());
        let content = dom.add_node(".ut-login-content");
        dom.add_child(content, "button.primary");
        let email = dom.add_node("#email");
        let password = dom.add_node("#password");
        let submit = dom.add_node(".otkbtn-primary");
        // No tab bar ever appears, so verification fails.

        let err = routine(dom.clone(), Arc::new(FakeChannel::new()))
            .login(&credentials(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::LoginFailed));

        let typed = dom.typed();
        assert!(typed.contains(&(email, "pilot@example.com".to_string())));
        assert!(typed.contains(&(password, "hunter2".to_string())));
        assert_eq!(dom.clicks().iter().filter(|&&c| c == submit).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_factor_form_without_source_fails() {
        let dom = Arc::new(FakeDom::new());
        let content = dom.add_node(".ut-login-content");
        dom.add_child(content, "button.primary");
        dom.add_node("#email");
        dom.add_node("#password");
        dom.add_node(".otkbtn-primary");
        dom.add_node("#verification-form");

        let err = routine(dom, Arc::new(FakeChannel::new()))
            .login(&credentials(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::LoginFailed));
    }
}
