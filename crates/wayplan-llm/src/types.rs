//! The backend capability trait consumed by the request orchestrator.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;

/// Trait for text generation backend implementations.
///
/// Implementations must enforce their own request timeout and must observe
/// `cancel` promptly: when the token fires mid-request the call returns
/// [`GenError::Cancelled`] instead of waiting for the provider.
#[async_trait]
pub trait TextGenBackend: Send + Sync {
    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`GenError`] for any failure: auth, connectivity, provider
    /// status errors, filtered or undersized responses, timeout, or
    /// cancellation.
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, GenError>;
}
