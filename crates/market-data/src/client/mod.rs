//! Rate-limited, retrying client over a single [`MarketDataProvider`].
//!
//! Every request goes through the same gate, in order:
//!
//! 1. circuit breaker check (fail fast with `CircuitOpen` while open)
//! 2. concurrency permit (`max_concurrency`)
//! 3. token bucket + minimum spacing (`requests_per_minute`, `min_delay`)
//! 4. the provider call, bounded by the client timeout
//!
//! Transient failures are retried with exponential backoff up to the
//! configured attempt count; the breaker counts a failure only once a call
//! has exhausted its attempts. Responses are normalized before they leave the
//! client: currency upper-cased, non-positive prices rejected, history sorted
//! ascending and unique per date.

mod backoff;
mod circuit_breaker;
mod rate_limiter;

pub use backoff::{Backoff, RetryPolicy};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimitConfig, RateLimiter};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::PriceSample;
use crate::provider::{MarketDataProvider, RateLimit};

/// Default per-request timeout imposed by the client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client tuning. Anything left `None` falls back to the provider's own
/// [`RateLimit`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limit: Option<RateLimit>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit: None,
        }
    }
}

pub struct MarketDataClient {
    provider: Arc<dyn MarketDataProvider>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    permits: Semaphore,
    config: ClientConfig,
}

impl MarketDataClient {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: ClientConfig) -> Self {
        let limit = config
            .rate_limit
            .clone()
            .unwrap_or_else(|| provider.rate_limit());

        Self {
            rate_limiter: RateLimiter::new(RateLimitConfig::from(&limit)),
            circuit_breaker: CircuitBreaker::new(provider.id(), config.circuit_breaker.clone()),
            permits: Semaphore::new(limit.max_concurrency.max(1)),
            provider,
            config,
        }
    }

    /// Identifier of the wrapped provider, stored as the price source.
    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Latest quote for `ticker`, dated with the provider's market date.
    pub async fn fetch_latest_quote(&self, ticker: &str) -> Result<PriceSample, MarketDataError> {
        let sample = self
            .call(ticker, || self.provider.get_latest_quote(ticker))
            .await?;
        normalize_sample(sample).map_err(|message| MarketDataError::ValidationFailed {
            message: format!("{}: {}", ticker, message),
        })
    }

    /// Daily series for `from..=to`, ascending and unique per date.
    ///
    /// The series is fetched in one request; on failure the caller re-requests
    /// the whole range.
    pub async fn fetch_historical_series(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceSample>, MarketDataError> {
        if from > to {
            return Err(MarketDataError::ValidationFailed {
                message: format!("Invalid range {} > {}", from, to),
            });
        }

        let samples = self
            .call(ticker, || self.provider.get_historical_quotes(ticker, from, to))
            .await?;

        let mut by_date = BTreeMap::new();
        for sample in samples {
            if sample.date < from || sample.date > to {
                continue;
            }
            match normalize_sample(sample) {
                Ok(sample) => {
                    by_date.insert(sample.date, sample);
                }
                Err(message) => warn!("Dropping sample for {}: {}", ticker, message),
            }
        }

        if by_date.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        Ok(by_date.into_values().collect())
    }

    async fn call<T, F, Fut>(&self, ticker: &str, op: F) -> Result<T, MarketDataError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let provider = self.provider.id();
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if !self.circuit_breaker.is_allowed() {
                return Err(MarketDataError::CircuitOpen {
                    provider: provider.to_string(),
                });
            }

            let result = {
                let _permit =
                    self.permits
                        .acquire()
                        .await
                        .map_err(|_| MarketDataError::ProviderError {
                            provider: provider.to_string(),
                            message: "client is shutting down".to_string(),
                        })?;
                self.rate_limiter.acquire().await;

                match tokio::time::timeout(self.config.request_timeout, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(MarketDataError::Timeout {
                        provider: provider.to_string(),
                    }),
                }
            };

            let err = match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.retry_class() {
                RetryClass::WithBackoff => {
                    if attempt >= max_attempts {
                        // One breaker failure per exhausted call, not per attempt.
                        self.circuit_breaker.record_failure();
                        warn!(
                            "{} failed for {} after {} attempts: {}",
                            provider, ticker, attempt, err
                        );
                        return Err(err);
                    }
                    let delay = self.config.retry.backoff.delay(attempt - 1);
                    debug!(
                        "{} attempt {}/{} for {} failed ({}), retrying in {:?}",
                        provider, attempt, max_attempts, ticker, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryClass::Never => {
                    // The provider answered; it is reachable.
                    self.circuit_breaker.record_success();
                    return Err(err);
                }
                RetryClass::CircuitOpen => return Err(err),
            }
        }
    }
}

/// Enforce the sample contract: positive close, non-empty upper-case currency.
fn normalize_sample(mut sample: PriceSample) -> Result<PriceSample, String> {
    if sample.close <= Decimal::ZERO {
        return Err(format!("non-positive close {} on {}", sample.close, sample.date));
    }
    let currency = sample.currency.trim().to_uppercase();
    if currency.is_empty() {
        return Err(format!("missing currency on {}", sample.date));
    }
    sample.currency = currency;
    Ok(sample)
}
