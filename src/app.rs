//! Wiring: channel, surface, bridge and routines assembled from one
//! configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cdp_channel::{CdpChannel, ChromiumTransport, PageChannel};
use dom_kit::ScriptDom;
use serde_json::Value;
use service_bridge::ServiceBridge;
use task_flow::{
    Credentials, DailyTaskLoop, LoginRoutine, PackOpeningRoutine, SolveCtx, SolverRegistry,
};
use tracing::info;

use crate::config::AppConfig;

pub struct App {
    config: AppConfig,
    channel: Arc<CdpChannel>,
    ctx: SolveCtx,
    bridge: ServiceBridge,
    registry: SolverRegistry,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let transport = Arc::new(ChromiumTransport::new(config.channel_config()));
        let channel = Arc::new(CdpChannel::new(transport));
        let page: Arc<dyn PageChannel> = channel.clone();
        let dom = Arc::new(ScriptDom::new(page.clone()));
        let ctx = SolveCtx::new(dom, Arc::new(config.selectors.clone()));
        let bridge = ServiceBridge::new(page);

        Self {
            config,
            channel,
            ctx,
            bridge,
            registry: SolverRegistry::builtin(),
        }
    }

    fn credentials(&self) -> Result<Credentials> {
        let email = self
            .config
            .email
            .clone()
            .ok_or_else(|| anyhow!("no account e-mail configured (CLUBPILOT_EMAIL)"))?;
        let password = self
            .config
            .password
            .clone()
            .ok_or_else(|| anyhow!("no account password configured (CLUBPILOT_PASSWORD)"))?;
        Ok(Credentials { email, password })
    }

    fn login_routine(&self) -> LoginRoutine {
        LoginRoutine::new(self.ctx.clone(), self.channel.clone())
            .with_app_url(self.config.app_url.clone())
    }

    /// Log in, reusing the profile's live session when there is one.
    pub async fn login(&self) -> Result<()> {
        let credentials = self.credentials()?;
        self.login_routine()
            .login_with_retry(&credentials, None)
            .await
            .context("logging in")?;
        info!(target: "clubpilot", "session ready");
        Ok(())
    }

    async fn ensure_session(&self) -> Result<()> {
        let routine = self.login_routine();
        if routine.is_logged_in().await? {
            return Ok(());
        }
        self.login().await
    }

    /// Solve all open dailies, opening earned packs after each.
    pub async fn run_dailies(&self) -> Result<u32> {
        self.ensure_session().await?;
        let run = DailyTaskLoop::new(self.ctx.clone(), SolverRegistry::builtin());
        let solved = run.run().await.context("running daily loop")?;
        Ok(solved)
    }

    /// Open every available pack without touching the challenges screen.
    pub async fn open_packs(&self) -> Result<u32> {
        self.ensure_session().await?;
        let routine = PackOpeningRoutine::new(self.ctx.clone());
        routine.open_all().await.context("opening packs")
    }

    /// Solve one named task.
    pub async fn solve(&self, task: &str) -> Result<()> {
        self.ensure_session().await?;

        let solver = self
            .registry
            .get_solver(task, self.ctx.clone())
            .ok_or_else(|| {
                anyhow!(
                    "no solver for \"{task}\"; supported: {}",
                    self.registry.supported_tasks().join(", ")
                )
            })?;

        task_flow::Navigator::new(self.ctx.clone())
            .to_challenges_filter("All")
            .await?;
        solver.solve().await.with_context(|| format!("solving {task}"))?;
        Ok(())
    }

    /// Account snapshot through the service bridge.
    pub async fn status(&self) -> Result<Value> {
        self.ensure_session().await?;

        let init = self.bridge.initialize().await?;
        if !init.success {
            let err = init.error.map(|e| e.message).unwrap_or_default();
            return Err(anyhow!("service bridge unavailable: {err}"));
        }

        let user = self.bridge.get_user().await?.into_result().map_err(to_anyhow)?;
        let currencies = self
            .bridge
            .get_currencies()
            .await?
            .into_result()
            .map_err(to_anyhow)?;

        Ok(serde_json::json!({
            "user": user,
            "currencies": currencies,
        }))
    }

    pub fn supported_tasks(&self) -> Vec<String> {
        self.registry.supported_tasks()
    }
}

fn to_anyhow(err: service_bridge::ErrorInfo) -> anyhow::Error {
    anyhow!("service call failed ({}): {}", err.code, err.message)
}
