use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect_chrome_executable;

/// Configuration for launching and tuning the channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Chromium executable; empty path means "let chromiumoxide decide".
    pub executable: PathBuf,

    /// Profile directory. The companion app keeps its login session here,
    /// so reusing the directory skips the credential flow on later runs.
    pub user_data_dir: PathBuf,

    pub headless: bool,

    /// Per-command deadline in milliseconds.
    pub default_deadline_ms: u64,

    /// Attach to an already running browser instead of launching one.
    pub websocket_url: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable().unwrap_or_default(),
            user_data_dir: default_profile_dir(),
            headless: true,
            default_deadline_ms: 30_000,
            websocket_url: None,
        }
    }
}

fn default_profile_dir() -> PathBuf {
    if let Ok(path) = std::env::var("CLUBPILOT_CHROME_PROFILE") {
        return PathBuf::from(path);
    }
    Path::new("./.clubpilot-profile").into()
}
