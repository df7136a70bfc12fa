use thiserror::Error;

/// Failures surfaced by the execution channel itself.
///
/// These are the only failures that cross the bridge boundary as `Err`;
/// everything the page reports comes back inside a result envelope instead.
#[derive(Clone, Debug, Error)]
pub enum ChannelError {
    /// Chromium could not be launched or connected to.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// CDP communication failed (socket closed, protocol error, page gone).
    #[error("cdp i/o failure: {0}")]
    CdpIo(String),

    /// A command did not answer within its deadline.
    #[error("command timed out: {0}")]
    Timeout(String),

    /// The evaluated script threw before producing a value.
    #[error("script exception: {0}")]
    ScriptException(String),

    /// Invariant violation inside the channel.
    #[error("internal channel error: {0}")]
    Internal(String),
}

impl ChannelError {
    /// Whether a retry layer may reasonably re-attempt the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChannelError::CdpIo(_) | ChannelError::Timeout(_))
    }
}
