//! Hierarchical configuration with discovery and precedence.
//!
//! Precedence: explicit path > `WAYPLAN_CONFIG` env var >
//! `~/.config/wayplan/config.toml` > built-in defaults. Missing keys in a
//! config file fall back to the defaults section-by-section.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default request timeout enforced by the generation backend, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default maximum number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default progressive delay schedule between attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 3] = [1000, 2000, 4000];

/// Default wall-clock budget the progress ticker paces itself against, in seconds.
pub const DEFAULT_PROGRESS_BUDGET_SECS: u64 = 60;

/// Default cap on generated output tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// LLM backend configuration section (`[llm]`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name. Only "gemini" is currently supported.
    pub provider: String,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Optional custom base URL (defaults to the provider's public endpoint).
    pub base_url: Option<String>,
    /// Per-request timeout in seconds, enforced by the backend.
    pub timeout_secs: u64,
    /// Maximum output tokens requested from the provider.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: 0.7,
        }
    }
}

/// Request-orchestration configuration section (`[orchestrator]`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Progressive delay schedule between attempts, in milliseconds.
    /// Attempts beyond the schedule reuse its last entry.
    pub retry_delays_ms: Vec<u64>,
    /// Wall-clock budget the decorative progress ticker paces itself
    /// against, in seconds.
    pub progress_budget_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delays_ms: DEFAULT_RETRY_DELAYS_MS.to_vec(),
            progress_budget_secs: DEFAULT_PROGRESS_BUDGET_SECS,
        }
    }
}

/// Top-level wayplan configuration.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior. For embedding or tests,
/// construct a `Config` directly or use [`Config::minimal_for_testing()`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Discover configuration with standard precedence.
    ///
    /// `explicit` wins over the `WAYPLAN_CONFIG` environment variable, which
    /// wins over `~/.config/wayplan/config.toml`. If no file is found at any
    /// of these locations, built-in defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a file was found but could not be read or
    /// parsed. A missing file is not an error unless it was named explicitly.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = env::var("WAYPLAN_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Standard per-user config location (`~/.config/wayplan/config.toml`).
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wayplan").join("config.toml"))
    }

    /// Minimal configuration for tests: defaults with a test-only API key
    /// environment variable so tests never pick up a real credential.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        let mut config = Self::default();
        config.llm.api_key_env = "WAYPLAN_TEST_API_KEY".to_string();
        config
    }
}
