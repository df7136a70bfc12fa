use cdp_channel::ChannelError;
use dom_kit::{DomError, RetryExhausted};
use thiserror::Error;

/// Failures of the orchestration layer.
#[derive(Debug, Error)]
pub enum PilotError {
    /// A discovered task has no registered solver.
    #[error("no solver registered for task \"{0}\"")]
    NoSolver(String),

    /// Navigation landed somewhere other than the expected screen.
    #[error("expected {expected}, but found \"{found}\"")]
    Landmark { expected: String, found: String },

    /// No element carrying the given visible label inside the scope.
    #[error("no element labelled \"{label}\" in {scope}")]
    LabelNotFound { label: String, scope: String },

    /// Login ran but the logged-in landmark never appeared.
    #[error("login verification failed")]
    LoginFailed,

    /// A retried operation ran out of attempts.
    #[error("gave up after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// A bridge call resolved to a failure envelope.
    #[error("service call failed ({code}): {message}")]
    Service { code: String, message: String },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl PilotError {
    pub fn label_not_found(label: impl Into<String>, scope: impl Into<String>) -> Self {
        PilotError::LabelNotFound {
            label: label.into(),
            scope: scope.into(),
        }
    }
}

impl From<RetryExhausted<PilotError>> for PilotError {
    fn from(err: RetryExhausted<PilotError>) -> Self {
        PilotError::RetriesExhausted {
            attempts: err.attempts,
            message: err.last.to_string(),
        }
    }
}

impl From<service_bridge::ErrorInfo> for PilotError {
    fn from(err: service_bridge::ErrorInfo) -> Self {
        PilotError::Service {
            code: err.code,
            message: err.message,
        }
    }
}
