//! Clubpilot: companion-app automation over a CDP script channel.

pub mod app;
pub mod config;

pub use app::App;
pub use config::AppConfig;
