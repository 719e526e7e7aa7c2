//! Text generation backend abstraction for wayplan
//!
//! This crate defines the narrow capability the request orchestrator
//! consumes: "accepts a prompt and a cancellation signal, returns text or
//! fails with a classified error." Providers implement the
//! [`TextGenBackend`] trait; the orchestrator never sees provider details.
//!
//! The backend owns its own timeout (reference: 60 seconds). Retries are
//! deliberately NOT implemented here; the orchestrator drives the bounded
//! retry protocol and a backend call must map to exactly one HTTP request.

mod error;
mod gemini;
pub(crate) mod http_client;
mod types;

pub use error::GenError;
pub use gemini::GeminiBackend;
pub use types::TextGenBackend;

use wayplan_config::Config;

/// Create a text generation backend from configuration.
///
/// Only the `gemini` provider is currently supported.
///
/// # Errors
///
/// Returns `GenError::Misconfiguration` for unknown providers or when the
/// provider's configuration is incomplete (for example a missing API key
/// environment variable), which surfaces as an auth failure per the
/// provider's own rules.
pub fn from_config(config: &Config) -> Result<Box<dyn TextGenBackend>, GenError> {
    match config.llm.provider.as_str() {
        "gemini" => {
            let backend = GeminiBackend::new_from_config(config)?;
            Ok(Box::new(backend))
        }
        unknown => Err(GenError::Misconfiguration(format!(
            "Unknown text generation provider '{unknown}'. Supported providers: gemini.",
        ))),
    }
}
