//! High-level planning service: prompt construction, backend call, and
//! orchestration behind one object.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use wayplan_config::Config;
use wayplan_llm::{GenError, TextGenBackend};
use wayplan_orchestrator::{Orchestrator, OrchestratorError, Phase, StatusSnapshot};
use wayplan_prompt::{build_prompt, TripParams};

/// Generates travel itineraries from [`TripParams`].
///
/// One `Planner` owns one [`Orchestrator`] and one backend, so it carries
/// the single-request-at-a-time discipline of the orchestrator: a second
/// `generate` while one is in flight is rejected with
/// [`OrchestratorError::Busy`].
pub struct Planner {
    backend: Arc<dyn TextGenBackend>,
    orchestrator: Orchestrator,
}

impl Planner {
    /// Build a planner from an explicit backend and orchestrator.
    pub fn new(backend: Arc<dyn TextGenBackend>, orchestrator: Orchestrator) -> Self {
        Self {
            backend,
            orchestrator,
        }
    }

    /// Build a planner from configuration: the configured provider backend
    /// plus an orchestrator honoring the `[orchestrator]` section.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider is unknown or its API key is not
    /// available in the environment.
    pub fn from_config(config: &Config) -> Result<Self, GenError> {
        let backend: Arc<dyn TextGenBackend> = Arc::from(wayplan_llm::from_config(config)?);
        Ok(Self::new(backend, Orchestrator::from_config(config)))
    }

    /// Generate an itinerary for `params`, driving the request to a
    /// terminal [`Phase`].
    ///
    /// The generated text (or the surfaced error) is read back through
    /// [`snapshot`](Self::snapshot) or a [`subscribe`](Self::subscribe)
    /// receiver; the phase return value says only how the request settled.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Busy`] when a generation is already in
    /// flight.
    pub async fn generate(&self, params: &TripParams) -> Result<Phase, OrchestratorError> {
        let prompt = build_prompt(params);
        info!(
            destination = %params.destination,
            duration_days = params.duration_days,
            prompt_chars = prompt.len(),
            "starting itinerary generation"
        );

        let backend = Arc::clone(&self.backend);
        self.orchestrator
            .run(
                move |cancel| {
                    let backend = Arc::clone(&backend);
                    let prompt = prompt.clone();
                    async move { backend.generate(&prompt, &cancel).await }
                },
                "itinerary",
            )
            .await
    }

    /// Request cancellation of the in-flight generation, if any.
    pub fn cancel(&self) {
        self.orchestrator.cancel();
    }

    /// Discard the stored response.
    pub fn clear_response(&self) {
        self.orchestrator.clear_response();
    }

    /// Discard the stored error and reset the retry counter.
    pub fn clear_error(&self) {
        self.orchestrator.clear_error();
    }

    /// Current request state.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.orchestrator.snapshot()
    }

    /// Watch receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.orchestrator.subscribe()
    }

    /// Whether a generation is currently in flight.
    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct ScriptedBackend {
        response: Result<String, &'static str>,
    }

    #[async_trait]
    impl TextGenBackend for ScriptedBackend {
        async fn generate(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, GenError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(GenError::Network((*message).to_string())),
            }
        }
    }

    fn valid_itinerary() -> String {
        let mut text = String::from("Day 1: arrive and wander the old town. ");
        while text.len() < 700 {
            text.push_str("Morning museum, afternoon walk, evening dinner. ");
        }
        text
    }

    fn planner_with(response: Result<String, &'static str>) -> Planner {
        Planner::new(
            Arc::new(ScriptedBackend { response }),
            Orchestrator::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn generate_settles_succeeded_and_stores_the_response() {
        let planner = planner_with(Ok(valid_itinerary()));
        let params = TripParams::new("Lisbon", 4);

        let phase = planner.generate(&params).await.unwrap();
        assert_eq!(phase, Phase::Succeeded);

        let snap = planner.snapshot();
        assert!(snap.response.is_some());
        assert!(snap.error.is_none());
        assert_eq!(snap.progress, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn generate_surfaces_backend_failure_after_retries() {
        let planner = planner_with(Err("connection reset"));
        let params = TripParams::new("Lisbon", 4);

        let phase = planner.generate(&params).await.unwrap();
        assert_eq!(phase, Phase::Failed);

        let snap = planner.snapshot();
        assert!(snap.error.as_deref().unwrap().contains("connection reset"));
        assert!(snap.response.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_operations_delegate_to_the_orchestrator() {
        let planner = planner_with(Ok(valid_itinerary()));
        let params = TripParams::new("Kyoto", 3);

        planner.generate(&params).await.unwrap();
        assert!(planner.snapshot().response.is_some());

        planner.clear_response();
        assert!(planner.snapshot().response.is_none());
    }
}
