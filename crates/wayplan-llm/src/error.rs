//! Error taxonomy for text generation backends.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`TextGenBackend`](crate::TextGenBackend).
///
/// The orchestrator classifies these into exactly two buckets: `Cancelled`
/// stops the retry loop immediately; every other variant is transient and
/// retried until the attempt budget is exhausted.
#[derive(Debug, Error)]
pub enum GenError {
    /// No credential configured, or the provider rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connectivity failure reaching the provider.
    #[error("network error: {0}")]
    Network(String),

    /// Provider returned a non-success status.
    #[error("generation service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Provider returned zero candidates (safety filtering).
    #[error("response was blocked by the provider's content filtering")]
    ContentFiltered,

    /// Provider returned text below the minimum useful length.
    #[error("response too short: {length} characters (minimum {minimum})")]
    ShortResponse { length: usize, minimum: usize },

    /// The backend's own timeout elapsed before a response arrived.
    #[error("generation timed out after {}s", duration.as_secs())]
    Timeout { duration: Duration },

    /// The caller's cancellation signal fired while the call was in flight.
    #[error("generation was cancelled")]
    Cancelled,

    /// Payload arrived but could not be decoded.
    #[error("malformed response payload: {0}")]
    Malformed(String),

    /// Backend construction or configuration problem.
    #[error("misconfiguration: {0}")]
    Misconfiguration(String),
}

impl GenError {
    /// Whether this error represents a user-initiated cancellation.
    ///
    /// Cancellation is terminal for the retry loop; everything else is
    /// treated as transient.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
