use cdp_channel::ChannelError;
use thiserror::Error;

/// Error types for DOM operations and waits.
#[derive(Clone, Debug, Error)]
pub enum DomError {
    /// An element matching the selector never appeared within the bound.
    #[error("element \"{selector}\" not found within {waited_ms}ms")]
    WaitTimeout { selector: String, waited_ms: u64 },

    /// A named condition did not hold within the bound.
    #[error("condition \"{what}\" not met within {waited_ms}ms")]
    ConditionTimeout { what: String, waited_ms: u64 },

    /// The URL never matched the pattern within the bound.
    #[error("url did not match pattern \"{pattern}\" within {waited_ms}ms")]
    UrlTimeout { pattern: String, waited_ms: u64 },

    /// A handle refers to an element the page no longer renders.
    #[error("stale element handle: {0}")]
    StaleHandle(String),

    /// The element exists but cannot be interacted with.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// A page script returned something other than the expected shape.
    #[error("unexpected script payload: {0}")]
    Protocol(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl DomError {
    /// Timeouts and transport hiccups are worth re-attempting; stale handles
    /// and protocol mismatches are structural.
    pub fn is_retryable(&self) -> bool {
        match self {
            DomError::WaitTimeout { .. }
            | DomError::ConditionTimeout { .. }
            | DomError::UrlTimeout { .. } => true,
            DomError::Channel(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_timeout_names_selector_and_bound() {
        let err = DomError::WaitTimeout {
            selector: ".ut-tab-bar".into(),
            waited_ms: 10_000,
        };
        let message = err.to_string();
        assert!(message.contains(".ut-tab-bar"));
        assert!(message.contains("10000"));
    }

    #[test]
    fn retryability_split() {
        assert!(DomError::WaitTimeout {
            selector: "x".into(),
            waited_ms: 1
        }
        .is_retryable());
        assert!(!DomError::StaleHandle("h".into()).is_retryable());
        assert!(!DomError::Protocol("bad".into()).is_retryable());
    }
}
