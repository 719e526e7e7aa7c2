//! Configuration management for wayplan
//!
//! Provides TOML configuration with discovery and precedence:
//! explicit path > `WAYPLAN_CONFIG` environment variable >
//! `~/.config/wayplan/config.toml` > built-in defaults.

mod config;

pub use config::{
    Config, ConfigError, LlmConfig, OrchestratorConfig, DEFAULT_MAX_OUTPUT_TOKENS,
    DEFAULT_MAX_RETRIES, DEFAULT_PROGRESS_BUDGET_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_DELAYS_MS,
};
