//! Application configuration.
//!
//! Layered: defaults, then `clubpilot.toml` (working directory or the
//! user's config directory), then `CLUBPILOT_*` environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cdp_channel::ChannelConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use task_flow::{Selectors, APP_URL};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Account e-mail; also settable as `CLUBPILOT_EMAIL`.
    pub email: Option<String>,
    /// Account password; also settable as `CLUBPILOT_PASSWORD`.
    pub password: Option<String>,
    pub app_url: String,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    /// Attach to a running browser instead of launching one.
    pub websocket_url: Option<String>,
    pub selectors: Selectors,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            app_url: APP_URL.to_string(),
            headless: true,
            chrome_executable: None,
            profile_dir: None,
            websocket_url: None,
            selectors: Selectors::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("clubpilot").join("config.toml");
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder
            .add_source(File::with_name("clubpilot").required(false))
            .add_source(Environment::with_prefix("CLUBPILOT"));

        let cfg = builder.build().context("assembling configuration")?;
        cfg.try_deserialize().context("parsing configuration")
    }

    pub fn channel_config(&self) -> ChannelConfig {
        let mut cfg = ChannelConfig::default();
        if let Some(executable) = &self.chrome_executable {
            cfg.executable = executable.clone();
        }
        if let Some(profile) = &self.profile_dir {
            cfg.user_data_dir = profile.clone();
        }
        cfg.headless = self.headless;
        cfg.websocket_url = self.websocket_url.clone();
        cfg
    }
}
