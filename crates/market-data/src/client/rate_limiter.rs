//! Token bucket rate limiter with a minimum spacing between requests.
//!
//! The bucket bounds the sustained request rate (requests per minute) while
//! allowing short bursts; the spacing keeps back-to-back requests at least
//! `min_delay` apart even when tokens are available.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::provider::RateLimit;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: f64 = 10.0;

/// Token bucket state.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was refilled.
    last_update: Instant,
    /// Token refill rate (tokens per second).
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
    /// When the last token was handed out.
    last_grant: Option<Instant>,
}

impl TokenBucket {
    fn with_config(requests_per_minute: u32, capacity: f64) -> Self {
        let capacity = capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(requests_per_minute.max(1)) / 60.0,
            capacity,
            last_grant: None,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Time to wait before a token may be granted, honoring `min_delay`.
    /// Grants the token and returns zero when nothing needs to wait.
    fn try_acquire(&mut self, min_delay: Duration) -> Duration {
        self.refill();

        let spacing = self
            .last_grant
            .map(|at| min_delay.saturating_sub(at.elapsed()))
            .unwrap_or(Duration::ZERO);

        let refill_wait = if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        };

        let wait = spacing.max(refill_wait);
        if wait.is_zero() {
            self.tokens -= 1.0;
            self.last_grant = Some(Instant::now());
        }
        wait
    }
}

/// Rate limiter configuration.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Maximum requests per minute.
    pub requests_per_minute: u32,
    /// Maximum burst capacity.
    pub burst_capacity: f64,
    /// Minimum spacing between two granted requests.
    pub min_delay: Duration,
}

impl From<&RateLimit> for RateLimitConfig {
    fn from(limit: &RateLimit) -> Self {
        Self {
            requests_per_minute: limit.requests_per_minute,
            burst_capacity: DEFAULT_BUCKET_CAPACITY.min(f64::from(limit.requests_per_minute.max(1))),
            min_delay: limit.min_delay,
        }
    }
}

/// Thread-safe token bucket shared by every request to one provider.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    min_delay: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::with_config(
                config.requests_per_minute,
                config.burst_capacity,
            )),
            min_delay: config.min_delay,
        }
    }

    /// Lock the bucket, recovering from poison if necessary.
    ///
    /// The worst case after a poisoned lock is slightly inaccurate pacing.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait (asynchronously) until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait_time = self.lock_bucket().try_acquire(self.min_delay);
            if wait_time.is_zero() {
                return;
            }
            debug!("Rate limiter: waiting {:?}", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Try to acquire without waiting.
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().try_acquire(self.min_delay).is_zero()
    }

    /// Remaining tokens after refill.
    pub fn remaining_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rpm: u32, burst: f64, min_delay_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute: rpm,
            burst_capacity: burst,
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_exhausted() {
        let limiter = RateLimiter::new(config(60, 3.0, 0));

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::new(config(60, 1.0, 0)); // 1 token/second

        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_delay_spaces_requests() {
        let limiter = RateLimiter::new(config(6000, 10.0, 200));

        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new(config(60, 2.0, 0));

        limiter.acquire().await;
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[test]
    fn test_config_from_provider_rate_limit() {
        let limit = RateLimit {
            requests_per_minute: 4,
            max_concurrency: 1,
            min_delay: Duration::from_millis(500),
        };
        let config = RateLimitConfig::from(&limit);
        assert_eq!(config.burst_capacity, 4.0);
        assert_eq!(config.min_delay, Duration::from_millis(500));
    }
}
