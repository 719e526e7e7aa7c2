//! wayplan: AI travel-itinerary generation with bounded retries, progress
//! reporting, and cooperative cancellation.
//!
//! The heart of the crate is the request orchestrator in
//! `wayplan-orchestrator`: it wraps a single opaque "generate text from a
//! prompt" capability in a bounded retry loop with a progressive delay
//! schedule, a decorative progress simulation, response validation, and
//! cancellation. Everything else collaborates with that core through narrow
//! seams: prompt construction (`wayplan-prompt`), the Gemini HTTP backend
//! (`wayplan-llm`), and configuration (`wayplan-config`).
//!
//! Library consumers usually want [`Planner`], which wires the prompt
//! builder and a configured backend into the orchestrator:
//!
//! ```rust,no_run
//! use wayplan::{Config, Planner, TripParams};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::discover(None)?;
//! let planner = Planner::from_config(&config)?;
//!
//! let params = TripParams::new("Lisbon", 4).with_interest("food");
//! let phase = planner.generate(&params).await?;
//! println!("finished in phase {phase}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
mod planner;

pub use planner::Planner;

pub use wayplan_config::{Config, ConfigError};
pub use wayplan_llm::{GeminiBackend, GenError, TextGenBackend};
pub use wayplan_orchestrator::{
    validate_response, Orchestrator, OrchestratorError, Phase, RetryPolicy, StatusSnapshot,
    ValidationError,
};
pub use wayplan_prompt::{build_prompt, BudgetLevel, TravelPace, TripParams};
