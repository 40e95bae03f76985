//! Refresh staleness policy.
//!
//! Pure decision over a provider's last update timestamp and status; the
//! caller supplies `now` so identical inputs always give the same answer.

use crate::domain::provider::ProviderStatus;

pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StalenessPolicy {
    pub window_hours: f64,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl StalenessPolicy {
    pub fn new(window_hours: f64) -> Self {
        Self { window_hours }
    }

    /// Signed hours from `now_ms` until the window after `last_update_ms` closes.
    pub fn hours_until_next_run(&self, last_update_ms: i64, now_ms: i64) -> f64 {
        let next_allowed = last_update_ms as f64 + self.window_hours * MS_PER_HOUR;
        (next_allowed - now_ms as f64) / MS_PER_HOUR
    }

    /// Whether a cycle for a provider in `status` should run at `now_ms`.
    ///
    /// A never-run provider always refreshes. Otherwise a refresh is due once
    /// less than an hour of the window remains, and a provider that has not
    /// reached `Finished` is retried even inside the window.
    pub fn should_refresh(&self, last_update_ms: i64, status: ProviderStatus, now_ms: i64) -> bool {
        if last_update_ms == 0 {
            return true;
        }
        let hours = self.hours_until_next_run(last_update_ms, now_ms);
        hours < 1.0 || (hours > 1.0 && status != ProviderStatus::Finished)
    }
}

/// [`StalenessPolicy::should_refresh`] with the default 24 hour window.
pub fn should_refresh(last_update_ms: i64, status: ProviderStatus, now_ms: i64) -> bool {
    StalenessPolicy::default().should_refresh(last_update_ms, status, now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: i64 = 3_600_000;
    const NOW: i64 = 1_760_000_000_000;

    fn any_status() -> impl Strategy<Value = ProviderStatus> {
        prop_oneof![
            Just(ProviderStatus::Idle),
            Just(ProviderStatus::Running),
            Just(ProviderStatus::Finished),
            Just(ProviderStatus::Error),
        ]
    }

    #[test]
    fn never_run_refreshes() {
        assert!(should_refresh(0, ProviderStatus::Finished, NOW));
        assert!(should_refresh(0, ProviderStatus::Idle, NOW));
    }

    #[test]
    fn window_elapsed_refreshes() {
        let last = NOW - 25 * HOUR;
        assert!(should_refresh(last, ProviderStatus::Finished, NOW));
    }

    #[test]
    fn last_hour_of_window_refreshes() {
        // 30 minutes left in the window
        let last = NOW - 23 * HOUR - HOUR / 2;
        assert!(should_refresh(last, ProviderStatus::Finished, NOW));
    }

    #[test]
    fn finished_inside_window_waits() {
        let last = NOW - 2 * HOUR;
        assert!(!should_refresh(last, ProviderStatus::Finished, NOW));
    }

    #[test]
    fn unfinished_inside_window_retries() {
        let last = NOW - 2 * HOUR;
        assert!(should_refresh(last, ProviderStatus::Running, NOW));
        assert!(should_refresh(last, ProviderStatus::Error, NOW));
        assert!(should_refresh(last, ProviderStatus::Idle, NOW));
    }

    #[test]
    fn exactly_one_hour_left_does_not_refresh() {
        let last = NOW - 23 * HOUR;
        assert!(!should_refresh(last, ProviderStatus::Finished, NOW));
        assert!(!should_refresh(last, ProviderStatus::Error, NOW));
    }

    #[test]
    fn very_stale_data_refreshes() {
        let last = NOW - 24 * 365 * HOUR;
        let policy = StalenessPolicy::default();
        assert!(policy.hours_until_next_run(last, NOW) < 0.0);
        assert!(policy.should_refresh(last, ProviderStatus::Finished, NOW));
    }

    #[test]
    fn custom_window() {
        let policy = StalenessPolicy::new(6.0);
        let last = NOW - 4 * HOUR;
        assert!(!policy.should_refresh(last, ProviderStatus::Finished, NOW));
        let last = NOW - 5 * HOUR - HOUR / 2;
        assert!(policy.should_refresh(last, ProviderStatus::Finished, NOW));
    }

    proptest! {
        #[test]
        fn zero_last_update_always_refreshes(status in any_status(), now in 0i64..4_000_000_000_000) {
            prop_assert!(should_refresh(0, status, now));
        }

        #[test]
        fn finished_cooldown_holds(elapsed_ms in 1i64..(23 * HOUR - 1)) {
            let last = NOW - elapsed_ms;
            prop_assert!(!should_refresh(last, ProviderStatus::Finished, NOW));
        }

        #[test]
        fn decision_is_deterministic(
            last in 0i64..NOW,
            status in any_status(),
        ) {
            prop_assert_eq!(
                should_refresh(last, status, NOW),
                should_refresh(last, status, NOW)
            );
        }
    }
}
