//! Gemini HTTP backend implementation
//!
//! Calls the Gemini `generateContent` REST API. The backend enforces its own
//! request timeout and races the HTTP call against the caller's cancellation
//! token; retries belong to the orchestrator, never to this module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GenError;
use crate::http_client::HttpClient;
use crate::types::TextGenBackend;

/// Default Gemini API endpoint (model name is appended per request).
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Minimum useful response length in characters. Anything shorter is
/// reported as `ShortResponse` so the orchestrator treats it as a failed
/// attempt.
const MIN_RESPONSE_CHARS: usize = 500;

/// Gemini backend configuration
#[derive(Clone)]
pub struct GeminiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    max_output_tokens: u32,
    temperature: f32,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    ///
    /// # Errors
    ///
    /// Returns `GenError::Misconfiguration` if the HTTP client cannot be
    /// constructed.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        timeout: Duration,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<Self, GenError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model,
            timeout,
            max_output_tokens,
            temperature,
        })
    }

    /// Create a new Gemini backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GenError::Auth` if the API key environment variable named in
    /// the configuration is not set, and `GenError::Misconfiguration` if the
    /// HTTP client cannot be constructed.
    pub fn new_from_config(config: &wayplan_config::Config) -> Result<Self, GenError> {
        let llm = &config.llm;

        let api_key = std::env::var(&llm.api_key_env).map_err(|_| {
            GenError::Auth(format!(
                "Gemini API key not found in environment variable '{}'. \
                 Set this variable or configure a different api_key_env in [llm].",
                llm.api_key_env
            ))
        })?;

        Self::new(
            api_key,
            llm.base_url.clone(),
            llm.model.clone(),
            Duration::from_secs(llm.timeout_secs),
            llm.max_output_tokens,
            llm.temperature,
        )
    }

    fn request_url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, GenError> {
        if cancel.is_cancelled() {
            return Err(GenError::Cancelled);
        }

        debug!(
            provider = "gemini",
            model = %self.model,
            timeout_secs = self.timeout.as_secs(),
            prompt_chars = prompt.len(),
            "invoking Gemini backend"
        );

        let request_body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            },
        };

        let request = self
            .client
            .post(&self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body);

        let call = self.client.execute(request, self.timeout, "gemini");

        // Race the HTTP call against cancellation so an abort surfaces
        // promptly instead of waiting out the provider.
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(GenError::Cancelled),
            result = call => result?,
        };

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenError::Malformed(format!("failed to parse Gemini response: {e}")))?;

        let text = extract_text(&response_body)?;

        debug!(
            provider = "gemini",
            response_chars = text.len(),
            "Gemini invocation completed"
        );

        Ok(text)
    }
}

/// Extract the generated text from a Gemini response.
///
/// Zero candidates means the provider filtered the response; a response
/// below [`MIN_RESPONSE_CHARS`] is reported as too short.
fn extract_text(response: &GeminiResponse) -> Result<String, GenError> {
    let candidates = response.candidates.as_deref().unwrap_or_default();
    if candidates.is_empty() {
        return Err(GenError::ContentFiltered);
    }

    let mut parts_text = Vec::new();
    for candidate in candidates {
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(text) = &part.text {
                    parts_text.push(text.as_str());
                }
            }
        }
    }

    let text = parts_text.join("");
    if text.is_empty() {
        return Err(GenError::Malformed(
            "Gemini candidate carried no text content".to_string(),
        ));
    }

    if text.len() < MIN_RESPONSE_CHARS {
        return Err(GenError::ShortResponse {
            length: text.len(),
            minimum: MIN_RESPONSE_CHARS,
        });
    }

    Ok(text)
}

/// Gemini request body
#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini response body
#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
