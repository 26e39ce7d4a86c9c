use std::time::Duration;

/// Backoff for connection-level faults. The first attempt is followed by up
/// to `max_retries` more, the delay doubling after each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self { max_retries, initial_delay }
    }

    pub fn none() -> Self {
        Self { max_retries: 0, initial_delay: Duration::ZERO }
    }

    /// Delay to wait after the failed attempt number `retry` (zero based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}
