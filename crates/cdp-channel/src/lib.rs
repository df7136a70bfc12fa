//! Remote execution channel for the companion web app.
//!
//! The channel is the lowest layer of the stack: it runs an opaque script
//! string inside the single driven page and hands back the JSON value the
//! script produced. Everything above (DOM surface, service bridge,
//! orchestration) is expressed in terms of [`PageChannel`].

use std::{env, path::PathBuf};

use which::which;

pub mod channel;
pub mod config;
pub mod error;
pub mod transport;

pub use channel::{CdpChannel, PageChannel};
pub use config::ChannelConfig;
pub use error::ChannelError;
pub use transport::{CdpTransport, ChromiumTransport, CommandTarget};

/// Locate a Chromium/Chrome executable, preferring an explicit env override.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("CLUBPILOT_CHROME") {
        let path = PathBuf::from(raw);
        if path.exists() {
            return Some(path);
        }
    }

    const CANDIDATES: &[&str] = &[
        "chromium",
        "chromium-browser",
        "google-chrome",
        "google-chrome-stable",
        "chrome",
    ];

    for name in CANDIDATES {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    None
}
