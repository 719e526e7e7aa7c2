//! Retry policy: attempt budget and progressive delay schedule.

use std::time::Duration;

/// Maximum number of retries after the initial attempt.
pub const MAX_RETRIES: u32 = 3;

/// Progressive delay schedule, indexed by `attempt - 1`.
pub const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_millis(1000),
    Duration::from_millis(2000),
    Duration::from_millis(4000),
];

/// Delay applied to any attempt beyond the schedule's length.
const FALLBACK_DELAY: Duration = Duration::from_millis(4000);

/// Bounded retry policy with a progressive delay schedule.
///
/// A logical request makes `max_retries + 1` attempts in total. The delay
/// before attempt `k` (k >= 1) is `delays[k - 1]`; attempts beyond the
/// schedule reuse its last entry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay schedule indexed by `attempt - 1`.
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delays: RETRY_DELAYS.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the configuration section.
    #[must_use]
    pub fn from_config(config: &wayplan_config::OrchestratorConfig) -> Self {
        let delays = if config.retry_delays_ms.is_empty() {
            RETRY_DELAYS.to_vec()
        } else {
            config
                .retry_delays_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect()
        };

        Self {
            max_retries: config.max_retries,
            delays,
        }
    }

    /// Total attempts a logical request may make.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay inserted before attempt `attempt` (which must be >= 1).
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(FALLBACK_DELAY)
    }

    /// Coarse progress shown after attempt `attempt` fails, distinct from
    /// the fine-grained simulation so retries remain visible. Bounded below
    /// 100.
    #[must_use]
    pub fn coarse_progress(attempt: u32) -> f32 {
        (20.0 + 20.0 * attempt as f32).min(99.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_matches_spec_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_attempts(), 4);
        assert_eq!(policy.delay_before(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(4000));
    }

    #[test]
    fn attempts_beyond_schedule_reuse_last_delay() {
        let policy = RetryPolicy {
            max_retries: 6,
            delays: RETRY_DELAYS.to_vec(),
        };
        assert_eq!(policy.delay_before(4), Duration::from_millis(4000));
        assert_eq!(policy.delay_before(10), Duration::from_millis(4000));
    }

    #[test]
    fn empty_schedule_falls_back() {
        let policy = RetryPolicy {
            max_retries: 2,
            delays: Vec::new(),
        };
        assert_eq!(policy.delay_before(1), Duration::from_millis(4000));
    }

    #[test]
    fn from_config_converts_milliseconds() {
        let mut section = wayplan_config::OrchestratorConfig::default();
        section.max_retries = 2;
        section.retry_delays_ms = vec![250, 750];

        let policy = RetryPolicy::from_config(&section);
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay_before(1), Duration::from_millis(250));
        assert_eq!(policy.delay_before(2), Duration::from_millis(750));
        assert_eq!(policy.delay_before(3), Duration::from_millis(750));
    }

    #[test]
    fn coarse_progress_grows_per_attempt_and_stays_below_100() {
        assert_eq!(RetryPolicy::coarse_progress(0), 20.0);
        assert_eq!(RetryPolicy::coarse_progress(1), 40.0);
        assert_eq!(RetryPolicy::coarse_progress(2), 60.0);
        assert!(RetryPolicy::coarse_progress(50) < 100.0);
    }
}
