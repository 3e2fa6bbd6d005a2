//! Retry policy with exponential backoff, cap, and jitter.

use rand::Rng;
use std::time::Duration;

/// Internal retry policy for transient API failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry (before jitter).
    pub base_delay: Duration,
    /// Maximum delay cap, also applied to `Retry-After`.
    pub max_delay: Duration,
    /// Retries after the initial attempt (0 = single attempt).
    pub max_retries: u32,
    /// Delay is multiplied by a random value in [1-jitter, 1+jitter].
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            max_retries: 3,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-indexed): base * 2^retry, capped.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exponential_ms = base_ms.saturating_mul(1u64 << retry.min(20));
        let capped_ms = exponential_ms.min(self.max_delay.as_millis() as u64);

        if self.jitter <= 0.0 {
            return Duration::from_millis(capped_ms);
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        Duration::from_millis((capped_ms as f64 * factor) as u64)
    }

    /// Server-provided delay, capped at `max_delay`
    pub fn clamp_server_delay(&self, delay: Duration) -> Duration {
        delay.min(self.max_delay)
    }

    /// Check if another retry should be made after `retry` retries.
    pub fn should_retry(&self, retry: u32) -> bool {
        retry < self.max_retries
    }
}
