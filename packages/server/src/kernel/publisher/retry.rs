use std::time::Duration;

/// Exponential backoff for whole-batch retries.
///
/// No delay before the first attempt; before attempt `r >= 2` the delay is
/// `base_delay * (backoff_factor - 1) * 2^(r - 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the 1-based `attempt`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let doublings = (attempt - 2).min(31);
        self.base_delay
            .saturating_mul(self.backoff_factor.saturating_sub(1))
            .saturating_mul(1u32 << doublings)
    }

    /// Total time spent sleeping if every attempt fails.
    pub fn total_delay(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_before(attempt))
            .sum()
    }
}
