//! Low-level CDP command transport.
//!
//! One task owns the websocket connection and multiplexes commands over it,
//! pairing responses to callers through an inflight call-id map. The trait is
//! the seam the tests mock; production uses [`ChromiumTransport`], which
//! launches (or attaches to) a Chromium and keeps the connection alive for
//! the lifetime of the process. Dropping the transport drops our reference
//! only; an externally provided browser is never torn down here.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::async_process::Child;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::target::SessionId as CdpSessionId;
use chromiumoxide::cdp::events::CdpEventMessage;
use chromiumoxide::conn::Connection;
use chromiumoxide::error::CdpError;
use chromiumoxide_types::{CallId, Message, MethodId, Response};
use futures::io::{AsyncBufReadExt, BufReader};
use futures::stream::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::error::ChannelError;

/// Addressing for a command: the browser endpoint or an attached session.
#[derive(Clone, Debug)]
pub enum CommandTarget {
    Browser,
    Session(String),
}

#[async_trait]
pub trait CdpTransport: Send + Sync {
    async fn start(&self) -> Result<(), ChannelError>;

    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, ChannelError>;
}

/// Production transport over a launched or attached Chromium.
pub struct ChromiumTransport {
    cfg: ChannelConfig,
    state: OnceCell<Mutex<Option<Arc<RuntimeState>>>>,
}

impl ChromiumTransport {
    pub fn new(cfg: ChannelConfig) -> Self {
        Self {
            cfg,
            state: OnceCell::new(),
        }
    }

    /// Returns the live runtime, starting a fresh one if the previous
    /// connection died underneath us.
    async fn runtime(&self) -> Result<Arc<RuntimeState>, ChannelError> {
        let cell = self.state.get_or_init(|| async { Mutex::new(None) }).await;
        let mut guard = cell.lock().await;

        if let Some(rt) = guard.as_ref() {
            if rt.is_alive() {
                return Ok(rt.clone());
            }
        }

        let runtime = Arc::new(RuntimeState::start(self.cfg.clone()).await?);
        *guard = Some(runtime.clone());
        Ok(runtime)
    }
}

#[async_trait]
impl CdpTransport for ChromiumTransport {
    async fn start(&self) -> Result<(), ChannelError> {
        let runtime = self.runtime().await?;
        let deadline = Duration::from_millis(self.cfg.default_deadline_ms);

        runtime
            .send(
                CommandTarget::Browser,
                "Target.setDiscoverTargets",
                serde_json::json!({ "discover": true }),
                deadline,
            )
            .await?;

        Ok(())
    }

    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, ChannelError> {
        let runtime = self.runtime().await?;
        runtime
            .send(
                target,
                method,
                params,
                Duration::from_millis(self.cfg.default_deadline_ms),
            )
            .await
    }
}

struct ControlMessage {
    target: CommandTarget,
    method: String,
    params: Value,
    responder: oneshot::Sender<Result<Value, ChannelError>>,
}

struct RuntimeState {
    command_tx: mpsc::Sender<ControlMessage>,
    loop_task: JoinHandle<()>,
    child: Mutex<Option<Child>>,
    alive: Arc<AtomicBool>,
}

impl RuntimeState {
    async fn start(cfg: ChannelConfig) -> Result<Self, ChannelError> {
        let (child, ws_url) = if let Some(url) = cfg.websocket_url.clone() {
            (None, url)
        } else {
            let browser_cfg = Self::browser_config(&cfg)?;
            Self::launch_browser(browser_cfg).await?
        };

        let conn = Connection::<CdpEventMessage>::connect(&ws_url)
            .await
            .map_err(|err| ChannelError::CdpIo(err.to_string()))?;

        let (command_tx, command_rx) = mpsc::channel(64);
        let alive = Arc::new(AtomicBool::new(true));
        let loop_alive = alive.clone();

        let loop_task = tokio::spawn(async move {
            if let Err(err) = Self::run_loop(conn, command_rx).await {
                warn!(target: "cdp-channel", ?err, "transport loop terminated with error");
            }
            loop_alive.store(false, Ordering::Relaxed);
        });

        info!(target: "cdp-channel", url = %ws_url, "chromium connection established");

        Ok(Self {
            command_tx,
            loop_task,
            child: Mutex::new(child),
            alive,
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    async fn send(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
        deadline: Duration,
    ) -> Result<Value, ChannelError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let message = ControlMessage {
            target,
            method: method.to_string(),
            params,
            responder: resp_tx,
        };

        self.command_tx
            .send(message)
            .await
            .map_err(|err| ChannelError::CdpIo(err.to_string()))?;

        match tokio::time::timeout(deadline, resp_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ChannelError::CdpIo(
                "command response channel closed".into(),
            )),
            Err(_) => Err(ChannelError::Timeout(format!(
                "{} did not answer within {}ms",
                method,
                deadline.as_millis()
            ))),
        }
    }

    fn browser_config(cfg: &ChannelConfig) -> Result<BrowserConfig, ChannelError> {
        let profile_dir = if cfg.user_data_dir.is_absolute() {
            cfg.user_data_dir.clone()
        } else {
            let cwd = std::env::current_dir()
                .map_err(|err| ChannelError::Internal(format!("failed to resolve cwd: {err}")))?;
            cwd.join(&cfg.user_data_dir)
        };
        fs::create_dir_all(&profile_dir).map_err(|err| {
            ChannelError::Internal(format!("failed to ensure user-data-dir: {err}"))
        })?;

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_millis(cfg.default_deadline_ms))
            .launch_timeout(Duration::from_secs(20))
            .user_data_dir(profile_dir);

        if !cfg.headless {
            builder = builder.with_head();
        }

        let mut args = vec![
            "--disable-background-networking",
            "--disable-component-update",
            "--disable-default-apps",
            "--disable-dev-shm-usage",
            "--disable-hang-monitor",
            "--disable-popup-blocking",
            "--disable-sync",
            "--no-first-run",
            "--no-default-browser-check",
            "--password-store=basic",
            "--remote-allow-origins=*",
        ];
        if cfg.headless {
            args.push("--headless=new");
            args.push("--mute-audio");
        }
        builder = builder.args(args);

        if !cfg.executable.as_os_str().is_empty() {
            if !cfg.executable.exists() {
                return Err(ChannelError::Launch(format!(
                    "chrome executable not found at {}; set CLUBPILOT_CHROME",
                    cfg.executable.display()
                )));
            }
            builder = builder.chrome_executable(cfg.executable.clone());
        }

        builder
            .build()
            .map_err(|err| ChannelError::Launch(format!("browser config error: {err}")))
    }

    async fn launch_browser(
        config: BrowserConfig,
    ) -> Result<(Option<Child>, String), ChannelError> {
        let mut child = config
            .launch()
            .map_err(|err| ChannelError::Launch(format!("failed to launch chromium: {err}")))?;

        let ws_url = Self::extract_ws_url(&mut child).await?;
        Ok((Some(child), ws_url))
    }

    /// Chromium prints the DevTools endpoint on stderr shortly after start.
    async fn extract_ws_url(child: &mut Child) -> Result<String, ChannelError> {
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ChannelError::Launch("chromium process missing stderr".into()))?;
        let mut lines = BufReader::new(stderr).lines();

        let reader = async {
            while let Some(line) = lines.next().await {
                let line = line.map_err(|err| ChannelError::Launch(err.to_string()))?;
                if let Some((_, ws)) = line.rsplit_once("listening on ") {
                    let ws = ws.trim();
                    if ws.starts_with("ws") && ws.contains("devtools/browser") {
                        return Ok(ws.to_string());
                    }
                }
            }
            Err(ChannelError::Launch(
                "chromium exited before exposing the devtools websocket url".into(),
            ))
        };

        tokio::time::timeout(Duration::from_secs(20), reader)
            .await
            .map_err(|_| {
                ChannelError::Timeout("waiting for chromium devtools websocket url".into())
            })?
    }

    async fn run_loop(
        mut conn: Connection<CdpEventMessage>,
        mut command_rx: mpsc::Receiver<ControlMessage>,
    ) -> Result<(), ChannelError> {
        let mut inflight: HashMap<CallId, oneshot::Sender<Result<Value, ChannelError>>> =
            HashMap::new();

        loop {
            tokio::select! {
                Some(cmd) = command_rx.recv() => {
                    Self::submit(&mut conn, cmd, &mut inflight);
                }
                message = conn.next() => {
                    match message {
                        Some(Ok(Message::Response(resp))) => {
                            Self::settle(resp, &mut inflight);
                        }
                        Some(Ok(Message::Event(event))) => {
                            // The channel drives exactly one page and polls
                            // its state; unsolicited events are not consumed.
                            debug!(target: "cdp-channel", ?event, "event discarded");
                        }
                        Some(Err(err)) => {
                            let mapped = Self::map_cdp_error(err);
                            for (_, sender) in inflight.drain() {
                                let _ = sender.send(Err(mapped.clone()));
                            }
                            return Err(mapped);
                        }
                        None => {
                            let err = ChannelError::CdpIo("cdp connection closed".into());
                            for (_, sender) in inflight.drain() {
                                let _ = sender.send(Err(err.clone()));
                            }
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn submit(
        conn: &mut Connection<CdpEventMessage>,
        cmd: ControlMessage,
        inflight: &mut HashMap<CallId, oneshot::Sender<Result<Value, ChannelError>>>,
    ) {
        let session = match cmd.target {
            CommandTarget::Browser => None,
            CommandTarget::Session(session_id) => Some(CdpSessionId::from(session_id)),
        };

        let method_id: MethodId = cmd.method.clone().into();
        match conn.submit_command(method_id, session, cmd.params) {
            Ok(call_id) => {
                inflight.insert(call_id, cmd.responder);
            }
            Err(err) => {
                let _ = cmd.responder.send(Err(ChannelError::CdpIo(err.to_string())));
            }
        }
    }

    fn settle(
        resp: Response,
        inflight: &mut HashMap<CallId, oneshot::Sender<Result<Value, ChannelError>>>,
    ) {
        let Some(sender) = inflight.remove(&resp.id) else {
            return;
        };

        let result = if let Some(result) = resp.result {
            Ok(result)
        } else if let Some(error) = resp.error {
            Err(ChannelError::CdpIo(format!(
                "cdp error {}: {}",
                error.code, error.message
            )))
        } else {
            Err(ChannelError::Internal("empty cdp response".into()))
        };

        let _ = sender.send(result);
    }

    fn map_cdp_error(err: CdpError) -> ChannelError {
        let hint = err.to_string();
        match err {
            CdpError::Timeout => ChannelError::Timeout(hint),
            CdpError::JavascriptException(_) => ChannelError::ScriptException(hint),
            _ => ChannelError::CdpIo(hint),
        }
    }
}

impl Drop for RuntimeState {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
        self.loop_task.abort();

        if let Ok(mut guard) = self.child.try_lock() {
            if let Some(mut child) = guard.take() {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        if let Err(err) = child.kill().await {
                            warn!(target: "cdp-channel", ?err, "failed to kill chromium child");
                        }
                    });
                }
            }
        }
    }
}
