//! Request state owned by the orchestrator and its presentation snapshot.
//!
//! All mutation goes through [`StateCell`], which serializes writers behind
//! one lock and publishes an immutable [`StatusSnapshot`] to a watch channel
//! after every change. The decorative simulation and the retry loop both
//! write progress through the same entry point (`set_progress`), so their
//! interleaving is observable in one place.

use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Lifecycle phase of one logical generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No request has been started since construction or the last clear.
    #[default]
    Idle,
    /// The retry loop and progress simulation are active.
    Running,
    /// A validated response was stored.
    Succeeded,
    /// Every attempt failed; the last error is stored.
    Failed,
    /// The request was cancelled; no result and no error are stored.
    Cancelled,
}

impl Phase {
    /// Whether no further automatic transition occurs from this phase.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Immutable view of the request state for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Running AND no error currently set. A request that just failed is
    /// never reported as loading, not even momentarily.
    pub is_loading: bool,
    /// Message of the last attempt's error, set only in `Failed`.
    pub error: Option<String>,
    /// The validated response text, set only in `Succeeded`.
    pub response: Option<String>,
    /// Progress percent in [0, 100]. Exactly 100 only in `Succeeded`.
    pub progress: f32,
    /// Human-readable status line.
    pub current_message: String,
    /// 0-based count of attempts made so far.
    pub retry_count: u32,
}

#[derive(Debug, Default)]
struct RequestState {
    phase: Phase,
    attempt: u32,
    progress_percent: f32,
    status_message: String,
    result: Option<String>,
    last_error: Option<String>,
}

impl RequestState {
    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase,
            is_loading: self.phase == Phase::Running && self.last_error.is_none(),
            error: self.last_error.clone(),
            response: self.result.clone(),
            progress: self.progress_percent,
            current_message: self.status_message.clone(),
            retry_count: self.attempt,
        }
    }
}

/// Shared request state with watch-channel publication.
///
/// Writers that only make sense mid-request (`set_progress`, `set_message`,
/// `record_attempt`) are no-ops outside `Running`, which is what guarantees
/// that a leaked or late timer tick can never produce a phantom update after
/// the request reached a terminal phase.
pub(crate) struct StateCell {
    inner: Mutex<RequestState>,
    tx: watch::Sender<StatusSnapshot>,
}

impl StateCell {
    pub fn new() -> Self {
        let initial = RequestState::default();
        let (tx, _rx) = watch::channel(initial.snapshot());
        Self {
            inner: Mutex::new(initial),
            tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RequestState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RequestState) {
        self.tx.send_replace(state.snapshot());
    }

    /// Reset for a new logical request and enter `Running`, unless a request
    /// is already in flight.
    ///
    /// Returns `false` without touching state when the phase is `Running`.
    pub fn try_begin_run(&self, initial_message: &str) -> bool {
        let mut state = self.lock();
        if state.phase == Phase::Running {
            return false;
        }
        *state = RequestState {
            phase: Phase::Running,
            attempt: 0,
            progress_percent: 0.0,
            status_message: initial_message.to_string(),
            result: None,
            last_error: None,
        };
        self.publish(&state);
        true
    }

    /// Record the current attempt number. No-op outside `Running`.
    pub fn record_attempt(&self, attempt: u32) {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return;
        }
        state.attempt = attempt;
        self.publish(&state);
    }

    /// Single entry point for progress writes from both the fine-grained
    /// simulation and the retry loop's coarse updates. Values are capped
    /// just below 100; only `succeed` may set 100. No-op outside `Running`.
    pub fn set_progress(&self, percent: f32) {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return;
        }
        state.progress_percent = percent.clamp(0.0, 99.0);
        self.publish(&state);
    }

    /// Overwrite the status message. No-op outside `Running`.
    pub fn set_message(&self, message: &str) {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return;
        }
        state.status_message = message.to_string();
        self.publish(&state);
    }

    /// Transition to `Succeeded` with the validated response.
    ///
    /// Returns `false` when the request already left `Running` (for example
    /// through cancellation), in which case nothing is stored.
    pub fn succeed(&self, response: String, message: &str) -> bool {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return false;
        }
        state.phase = Phase::Succeeded;
        state.progress_percent = 100.0;
        state.status_message = message.to_string();
        state.result = Some(response);
        state.last_error = None;
        self.publish(&state);
        true
    }

    /// Transition to `Failed`, storing the last attempt's error message.
    ///
    /// Returns `false` when the request already left `Running`.
    pub fn fail(&self, error: String, message: &str) -> bool {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return false;
        }
        state.phase = Phase::Failed;
        state.progress_percent = 0.0;
        state.status_message = message.to_string();
        state.result = None;
        state.last_error = Some(error);
        self.publish(&state);
        true
    }

    /// Transition to `Cancelled`, clearing progress and status message.
    ///
    /// Idempotent: returns `false` when the request is not `Running`, so a
    /// second call (or a call after a terminal phase) changes nothing.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.phase != Phase::Running {
            return false;
        }
        state.phase = Phase::Cancelled;
        state.progress_percent = 0.0;
        state.status_message.clear();
        self.publish(&state);
        true
    }

    /// Clear the stored response. Phase is left untouched.
    pub fn clear_response(&self) {
        let mut state = self.lock();
        state.result = None;
        self.publish(&state);
    }

    /// Clear the stored error and reset the attempt counter. Phase is left
    /// untouched.
    pub fn clear_error(&self) {
        let mut state = self.lock();
        state.last_error = None;
        state.attempt = 0;
        self.publish(&state);
    }

    pub fn is_running(&self) -> bool {
        self.lock().phase == Phase::Running
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }
}
