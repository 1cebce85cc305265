//! Backoff policy for rate-limited requests

use rand::Rng;
use std::time::Duration;

/// Exponential backoff applied to HTTP 429 responses.
///
/// The wait before retry `attempt` (0-indexed) is
/// `min(base_wait * 2^attempt + jitter, max_wait)` with jitter drawn
/// uniformly from `[0, 1)` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Wait before the first retry
    pub base_wait: Duration,
    /// Upper bound for any single wait
    pub max_wait: Duration,
    /// Add random jitter in `[0, 1)` seconds to each wait
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 15,
            base_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether another retry is allowed after `attempt` retries
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Wait before retry `attempt`, drawing fresh jitter
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter {
            rand::thread_rng().gen_range(0.0..1.0)
        } else {
            0.0
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Wait before retry `attempt` for a given jitter sample in seconds
    pub fn delay_with_jitter(&self, attempt: u32, jitter_secs: f64) -> Duration {
        // 2^63 seconds is far past any sane max_wait
        let factor = 2f64.powi(attempt.min(63) as i32);
        let wait = self.base_wait.as_secs_f64() * factor + jitter_secs.max(0.0);
        let capped = wait.min(self.max_wait.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 15);
        assert_eq!(policy.base_wait, Duration::from_secs(1));
        assert_eq!(policy.max_wait, Duration::from_secs(60));
        assert!(policy.jitter);
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 2.0)]
    #[case(2, 4.0)]
    #[case(5, 32.0)]
    #[case(6, 60.0)]
    #[case(40, 60.0)]
    #[case(1000, 60.0)]
    fn test_delay_without_jitter(#[case] attempt: u32, #[case] expected_secs: f64) {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(attempt, 0.0),
            Duration::from_secs_f64(expected_secs)
        );
    }

    #[test]
    fn test_jitter_is_added_before_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(1, 0.5),
            Duration::from_secs_f64(2.5)
        );
        assert_eq!(policy.delay_with_jitter(6, 0.99), Duration::from_secs(60));
    }

    #[test]
    fn test_random_delay_within_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 0..20 {
            let delay = policy.delay(attempt);
            let floor = policy.delay_with_jitter(attempt, 0.0);
            assert!(delay >= floor);
            assert!(delay < floor + Duration::from_secs(1) || delay == policy.max_wait);
            assert!(delay <= policy.max_wait);
        }
    }

    #[test]
    fn test_delays_non_decreasing_up_to_cap() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..policy.max_retries {
            // Worst case for monotonicity: high jitter then low jitter
            let high = policy.delay_with_jitter(attempt, 0.999);
            let low = policy.delay_with_jitter(attempt + 1, 0.0);
            assert!(low >= high || low == policy.max_wait);
            let current = policy.delay(attempt);
            assert!(current >= previous || previous == policy.max_wait);
            previous = current;
        }
    }

    #[test]
    fn test_should_retry_respects_cap() {
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::default()
        };
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!RetryPolicy::disabled().should_retry(0));
    }
}
