//! Exponential backoff with jitter for submission retries.

use std::time::Duration;

use rand::Rng;

/// Retry policy for the submit phase of the signing protocol.
///
/// Only the submit phase is ever retried; re-running the sign phase would
/// produce a second, equally valid signature for the same intent.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (1 = no retries).
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub base_ms: u64,
    /// Upper bound on any single delay.
    pub max_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_ms,
            max_ms,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 250, 5_000)
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
        assert!(max.as_millis() <= 1100);
    }

    #[test]
    fn test_policy_enforces_minimum_one_attempt() {
        let policy = RetryPolicy::new(0, 100, 1000);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_policy_delay_after_first_failure() {
        let policy = RetryPolicy::new(3, 250, 5_000);
        let d = policy.delay_after(1);
        assert!(d.as_millis() >= 250);
    }
}
