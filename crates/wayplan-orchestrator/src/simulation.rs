//! Decorative progress simulation: a fine-grained progress ticker and a
//! rotating status-message writer that run alongside the retry loop.
//!
//! Both tasks write through [`StateCell`]'s guarded setters, so they go
//! inert the instant the request leaves `Running`. The [`SimulationGuard`]
//! aborts them on drop, which ties their lifetime to the `run` call on every
//! exit path (success, exhaustion, cancellation, caller teardown).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::StateCell;

/// Wall-clock budget the progress ticker paces itself against.
pub const DEFAULT_PROGRESS_BUDGET: Duration = Duration::from_secs(60);

/// Period of the fine-grained progress ticker.
const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// Period of the status-message rotation.
const MESSAGE_ROTATION: Duration = Duration::from_millis(3000);

/// The ticker never reports beyond this; the final stretch is reserved for
/// actual completion.
const PROGRESS_SIM_CAP: f32 = 95.0;

/// Rotating status lines shown while a request is running. The retry loop's
/// own writes (retry announcements, "generating", completion) overwrite
/// these at the instant they occur; the rotator keeps going in between.
pub const STATUS_MESSAGES: [&str; 10] = [
    "Scanning destination highlights...",
    "Mapping out neighborhoods worth your time...",
    "Balancing each day's pacing...",
    "Cross-checking opening hours...",
    "Weaving in local food stops...",
    "Sequencing activities to cut down on backtracking...",
    "Fitting the plan to your budget...",
    "Adding a few off-the-beaten-path picks...",
    "Polishing the day-by-day schedule...",
    "Formatting your itinerary...",
];

/// Owned handles for the two simulation tasks, aborted on drop.
pub(crate) struct SimulationGuard {
    ticker: JoinHandle<()>,
    rotator: JoinHandle<()>,
}

impl SimulationGuard {
    /// Spawn the progress ticker and message rotator for one request.
    pub fn spawn(state: Arc<StateCell>, cancel: CancellationToken, budget: Duration) -> Self {
        let ticker = tokio::spawn(run_progress_ticker(
            Arc::clone(&state),
            cancel.clone(),
            budget,
        ));
        let rotator = tokio::spawn(run_message_rotator(state, cancel));

        Self { ticker, rotator }
    }
}

impl Drop for SimulationGuard {
    fn drop(&mut self) {
        self.ticker.abort();
        self.rotator.abort();
    }
}

/// Every 100ms, report elapsed time over the budget as a percentage, capped
/// at 95%. Self-stops once the cap is reached.
async fn run_progress_ticker(state: Arc<StateCell>, cancel: CancellationToken, budget: Duration) {
    let started = tokio::time::Instant::now();
    let budget_secs = budget.as_secs_f32().max(f32::EPSILON);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(PROGRESS_TICK) => {
                let fraction = started.elapsed().as_secs_f32() / budget_secs;
                let percent = (fraction * 100.0).min(PROGRESS_SIM_CAP);
                state.set_progress(percent);
                if percent >= PROGRESS_SIM_CAP {
                    break;
                }
            }
        }
    }
}

/// Every 3 seconds, advance to the next status message (cyclic).
async fn run_message_rotator(state: Arc<StateCell>, cancel: CancellationToken) {
    let mut index = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(MESSAGE_ROTATION) => {
                state.set_message(STATUS_MESSAGES[index]);
                index = (index + 1) % STATUS_MESSAGES.len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateCell;

    #[tokio::test(start_paused = true)]
    async fn ticker_paces_progress_against_budget_and_caps_at_95() {
        let state = Arc::new(StateCell::new());
        state.try_begin_run("go");
        let cancel = CancellationToken::new();

        let _guard = SimulationGuard::spawn(
            Arc::clone(&state),
            cancel.clone(),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        let halfway = state.snapshot().progress;
        assert!((49.0..=51.0).contains(&halfway), "got {halfway}");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(state.snapshot().progress, PROGRESS_SIM_CAP);
    }

    #[tokio::test(start_paused = true)]
    async fn rotator_cycles_through_all_messages() {
        let state = Arc::new(StateCell::new());
        state.try_begin_run("go");
        let cancel = CancellationToken::new();

        let _guard = SimulationGuard::spawn(
            Arc::clone(&state),
            cancel.clone(),
            Duration::from_secs(600),
        );

        // Sleep slightly past each rotation boundary so the rotator's timer
        // is guaranteed to have fired before the assertion runs.
        let step = MESSAGE_ROTATION + Duration::from_millis(10);

        for expected in STATUS_MESSAGES {
            tokio::time::sleep(step).await;
            assert_eq!(state.snapshot().current_message, expected);
        }

        // Cyclic: the eleventh rotation wraps around.
        tokio::time::sleep(step).await;
        assert_eq!(state.snapshot().current_message, STATUS_MESSAGES[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_both_tasks() {
        let state = Arc::new(StateCell::new());
        state.try_begin_run("go");
        let cancel = CancellationToken::new();

        let guard = SimulationGuard::spawn(
            Arc::clone(&state),
            cancel.clone(),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        // Both tasks observe the token and finish on their own.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(guard.ticker.is_finished());
        assert!(guard.rotator.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_writes_are_inert_after_terminal_phase() {
        let state = Arc::new(StateCell::new());
        state.try_begin_run("go");
        let cancel = CancellationToken::new();

        let _guard = SimulationGuard::spawn(
            Arc::clone(&state),
            cancel.clone(),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        state.succeed("done".into(), "complete");

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snap = state.snapshot();
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.current_message, "complete");
    }
}
