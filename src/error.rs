use std::time::Duration;
use thiserror::Error;

/// Errors produced while receiving an OAuth authorization redirect
#[derive(Debug, Error)]
pub enum RedirectError {
    /// The OS could not provide a free loopback port
    #[error("port allocation failed: {0}")]
    PortAllocation(String),

    /// Binding or serving the loopback listener failed
    #[error("redirect listener error: {0}")]
    Listener(String),

    /// No redirect arrived within the wait ceiling
    ///
    /// The whole flow can be retried with a fresh receiver (and therefore a
    /// fresh port).
    #[error("no authorization redirect arrived within {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation signal fired before a redirect arrived
    ///
    /// This is an expected control path, not a fault.
    #[error("authorization wait cancelled")]
    Cancelled,

    /// The redirect carried a query string that could not be decoded
    ///
    /// Reserved: the decoder currently prefers producing a partial parameter
    /// map over failing, so well-behaved and even malformed authorization
    /// servers will not trigger this.
    #[error("malformed redirect: {0}")]
    MalformedRedirect(String),

    /// The receiver already bound its port for a receive attempt
    ///
    /// One receiver instance serves one authorization attempt; create a new
    /// receiver to retry.
    #[error("receiver already used for an authorization attempt")]
    AlreadyUsed,
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, RedirectError>;
