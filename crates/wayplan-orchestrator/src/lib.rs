//! Request orchestration for itinerary generation
//!
//! This crate owns the lifecycle of one logical generation request: it
//! issues the backend call, drives a bounded retry loop with progressive
//! delays, runs a decorative progress simulation alongside the real work,
//! validates the response shape, and exposes cooperative cancellation.
//!
//! The orchestrator consumes a single opaque capability ("accepts a
//! cancellation signal, returns text or fails") and publishes its state to
//! the presentation layer through a `tokio::sync::watch` channel of
//! [`StatusSnapshot`] values.
//!
//! # Lifecycle
//!
//! A logical request moves through [`Phase::Running`] into exactly one
//! terminal phase: [`Phase::Succeeded`], [`Phase::Failed`] (after all
//! attempts are exhausted), or [`Phase::Cancelled`]. Transient failures
//! between attempts are never surfaced individually; only the final outcome
//! is visible to callers.

mod orchestrator;
mod retry;
mod simulation;
mod state;
mod validation;

pub use orchestrator::{Orchestrator, OrchestratorError};
pub use retry::{RetryPolicy, MAX_RETRIES, RETRY_DELAYS};
pub use simulation::{STATUS_MESSAGES, DEFAULT_PROGRESS_BUDGET};
pub use state::{Phase, StatusSnapshot};
pub use validation::{validate_response, ValidationError, MIN_RAW_CHARS, MIN_TRIMMED_CHARS};
