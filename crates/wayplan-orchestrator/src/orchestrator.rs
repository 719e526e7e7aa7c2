//! The request orchestrator: bounded retries, progress simulation, and
//! cooperative cancellation around one logical generation request.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use wayplan_llm::GenError;

use crate::retry::RetryPolicy;
use crate::simulation::{SimulationGuard, DEFAULT_PROGRESS_BUDGET};
use crate::state::{Phase, StateCell, StatusSnapshot};
use crate::validation::validate_response;

/// Status line shown when every attempt has failed.
const FAILURE_MESSAGE: &str = "Generation failed. Please try again.";

/// Errors returned by [`Orchestrator::run`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A logical request is already running. The in-flight request is left
    /// untouched; callers that want to supersede it must `cancel()` first.
    #[error("a generation request is already running")]
    Busy,
}

/// Drives one logical generation request at a time.
///
/// `run` issues attempts through a caller-supplied request function, waits
/// out the progressive delay schedule between failures, and settles the
/// request state into exactly one terminal [`Phase`]. A fine-grained
/// progress ticker and a rotating status message run alongside the retry
/// loop and are torn down on every exit path.
///
/// Overlapping `run` calls are rejected with [`OrchestratorError::Busy`]
/// rather than superseding the in-flight request; see DESIGN.md.
pub struct Orchestrator {
    state: Arc<StateCell>,
    policy: RetryPolicy,
    progress_budget: Duration,
    cancel_token: Mutex<CancellationToken>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), DEFAULT_PROGRESS_BUDGET)
    }
}

impl Orchestrator {
    /// Create an orchestrator with an explicit retry policy and progress
    /// budget.
    #[must_use]
    pub fn new(policy: RetryPolicy, progress_budget: Duration) -> Self {
        Self {
            state: Arc::new(StateCell::new()),
            policy,
            progress_budget,
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Create an orchestrator from the configuration's `[orchestrator]`
    /// section.
    #[must_use]
    pub fn from_config(config: &wayplan_config::Config) -> Self {
        Self::new(
            RetryPolicy::from_config(&config.orchestrator),
            Duration::from_secs(config.orchestrator.progress_budget_secs),
        )
    }

    /// Run one logical generation request to a terminal phase.
    ///
    /// `request_fn` is invoked once per attempt with a child of the current
    /// cancellation token; it must observe the token promptly. Attempts are
    /// strictly sequential. `request_label` appears only in status messages.
    ///
    /// The returned phase is `Succeeded`, `Failed`, or `Cancelled`;
    /// cancellation resolves this future normally rather than failing it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Busy`] when another request is already
    /// running, leaving that request untouched.
    pub async fn run<F, Fut>(
        &self,
        mut request_fn: F,
        request_label: &str,
    ) -> Result<Phase, OrchestratorError>
    where
        F: FnMut(CancellationToken) -> Fut + Send,
        Fut: Future<Output = Result<String, GenError>> + Send,
    {
        if !self
            .state
            .try_begin_run(&format!("Preparing your {request_label}..."))
        {
            return Err(OrchestratorError::Busy);
        }

        // Fresh token per logical request; the previous one is already
        // settled or cancelled by the time try_begin_run lets us through.
        let cancel = CancellationToken::new();
        *self.lock_token() = cancel.clone();

        let _simulation = SimulationGuard::spawn(
            Arc::clone(&self.state),
            cancel.clone(),
            self.progress_budget,
        );

        let max_retries = self.policy.max_retries;
        let mut last_error = String::new();

        for attempt in 0..=max_retries {
            self.state.record_attempt(attempt);

            if attempt > 0 {
                self.state.set_message(&format!(
                    "Retrying your {request_label} (attempt {} of {})...",
                    attempt + 1,
                    max_retries + 1
                ));

                let delay = self.policy.delay_before(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "waiting before retry"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(self.settle_cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            // Checked proactively before each attempt, in addition to the
            // reactive races above and inside the backend call.
            if cancel.is_cancelled() {
                return Ok(self.settle_cancelled());
            }

            self.state
                .set_message(&format!("Generating your {request_label}..."));

            let outcome = request_fn(cancel.clone()).await;

            if cancel.is_cancelled() {
                return Ok(self.settle_cancelled());
            }

            match outcome {
                Ok(text) => match validate_response(&text) {
                    Ok(()) => {
                        debug!(attempt, chars = text.len(), "generation succeeded");
                        let stored = self
                            .state
                            .succeed(text, &format!("Your {request_label} is ready!"));
                        // A cancel that won the race leaves the state
                        // Cancelled; the response is then discarded.
                        return Ok(if stored {
                            Phase::Succeeded
                        } else {
                            self.settle_cancelled()
                        });
                    }
                    Err(invalid) => {
                        warn!(
                            attempt,
                            error = %invalid,
                            "incomplete response, treating attempt as failed"
                        );
                        last_error = invalid.to_string();
                    }
                },
                Err(err) if err.is_cancelled() => return Ok(self.settle_cancelled()),
                Err(err) => {
                    warn!(attempt, error = %err, "generation attempt failed");
                    last_error = err.to_string();
                }
            }

            if attempt < max_retries {
                self.state.set_progress(RetryPolicy::coarse_progress(attempt));
            }
        }

        warn!(
            attempts = max_retries + 1,
            error = %last_error,
            "all generation attempts exhausted"
        );
        if self.state.fail(last_error, FAILURE_MESSAGE) {
            Ok(Phase::Failed)
        } else {
            Ok(self.settle_cancelled())
        }
    }

    /// Request early termination of the in-flight request.
    ///
    /// Synchronously transitions the state to `Cancelled`, clears progress
    /// and the status message, and fires the cancellation token so the
    /// backoff delay and the backend call unwind promptly. Idempotent; a
    /// no-op when nothing is running.
    pub fn cancel(&self) {
        self.lock_token().cancel();
        if self.state.cancel() {
            debug!("generation request cancelled");
        }
    }

    /// Clear the stored response. Phase is left untouched.
    pub fn clear_response(&self) {
        self.state.clear_response();
    }

    /// Clear the stored error and reset the attempt counter. Phase is left
    /// untouched.
    pub fn clear_error(&self) {
        self.state.clear_error();
    }

    /// Current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    /// Subscribe to state changes. Every mutation publishes a fresh
    /// [`StatusSnapshot`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.state.subscribe()
    }

    /// Whether a logical request is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn settle_cancelled(&self) -> Phase {
        // cancel() usually got here first; this covers cancellation observed
        // through the backend error path.
        self.state.cancel();
        Phase::Cancelled
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        // Teardown of the owning context cancels anything still in flight so
        // no timer or pending backend call outlives the consumer.
        self.lock_token().cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn valid_itinerary() -> String {
        let mut text = String::from("Day 1: arrive and settle in. ");
        while text.len() < 700 {
            text.push_str("Morning walk, afternoon museum, evening food tour. ");
        }
        text
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_settles_immediately() {
        let orchestrator = Orchestrator::default();
        let calls = AtomicU32::new(0);

        let phase = orchestrator
            .run(
                |_cancel| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(valid_itinerary()) }
                },
                "itinerary",
            )
            .await
            .unwrap();

        assert_eq!(phase, Phase::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snap = orchestrator.snapshot();
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.response, Some(valid_itinerary()));
        assert!(snap.error.is_none());
        assert!(!snap.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn run_is_rejected_while_another_request_is_running() {
        let orchestrator = Arc::new(Orchestrator::default());

        let background = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .run(
                        |cancel| async move {
                            cancel.cancelled().await;
                            Err(GenError::Cancelled)
                        },
                        "itinerary",
                    )
                    .await
            })
        };

        // Let the first run reach its backend call.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_running());

        let second = orchestrator
            .run(|_cancel| async { Ok(valid_itinerary()) }, "itinerary")
            .await;
        assert_eq!(second, Err(OrchestratorError::Busy));

        orchestrator.cancel();
        let phase = background.await.unwrap().unwrap();
        assert_eq!(phase, Phase::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_can_be_followed_by_a_fresh_one() {
        let orchestrator = Orchestrator::new(
            RetryPolicy {
                max_retries: 0,
                delays: Vec::new(),
            },
            DEFAULT_PROGRESS_BUDGET,
        );

        let phase = orchestrator
            .run(
                |_cancel| async { Err(GenError::Network("connection reset".into())) },
                "itinerary",
            )
            .await
            .unwrap();
        assert_eq!(phase, Phase::Failed);
        let failed = orchestrator.snapshot();
        assert!(failed.error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(failed.progress, 0.0);

        let phase = orchestrator
            .run(|_cancel| async { Ok(valid_itinerary()) }, "itinerary")
            .await
            .unwrap();
        assert_eq!(phase, Phase::Succeeded);
        assert!(orchestrator.snapshot().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_response_is_retried_like_a_failure() {
        let orchestrator = Orchestrator::default();
        let calls = AtomicU32::new(0);

        let phase = orchestrator
            .run(
                |_cancel| {
                    let call = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if call == 0 {
                            // 600 raw chars, no itinerary markers.
                            Ok("x".repeat(600))
                        } else {
                            Ok(valid_itinerary())
                        }
                    }
                },
                "itinerary",
            )
            .await
            .unwrap();

        assert_eq!(phase, Phase::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_operations_do_not_touch_phase() {
        let orchestrator = Orchestrator::default();

        orchestrator
            .run(|_cancel| async { Ok(valid_itinerary()) }, "itinerary")
            .await
            .unwrap();

        orchestrator.clear_response();
        let snap = orchestrator.snapshot();
        assert_eq!(snap.phase, Phase::Succeeded);
        assert!(snap.response.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_any_run_is_a_no_op() {
        let orchestrator = Orchestrator::default();
        orchestrator.cancel();
        orchestrator.cancel();
        assert_eq!(orchestrator.snapshot().phase, Phase::Idle);
    }
}
