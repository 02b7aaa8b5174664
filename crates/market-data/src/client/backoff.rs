//! Retry policy with exponential backoff and jitter.

use std::time::Duration;

use rand::Rng;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Multiplier applied per subsequent retry.
    pub factor: f64,
    /// Upper bound for a single delay, jitter included.
    pub max: Duration,
    /// Apply +/- 50% random jitter.
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let scale = self.factor.powi(retry as i32);
        let mut secs = (self.base.as_secs_f64() * scale).min(self.max.as_secs_f64());
        if self.jitter && secs > 0.0 {
            secs *= rand::thread_rng().gen_range(0.5..=1.5);
        }
        Duration::from_secs_f64(secs.clamp(0.0, self.max.as_secs_f64()))
    }
}

/// How many times a transient failure is attempted, and how long to wait.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }
}
