//! Market data provider trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::PriceSample;

use super::rate_limit::RateLimit;

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use simfolio_market_data::provider::{MarketDataProvider, RateLimit};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement quote methods
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "BRAPI" or "YAHOO". Stored as the
    /// `source` of every price record written from this provider.
    fn id(&self) -> &'static str;

    /// Rate limits that should be applied when calling this provider.
    fn rate_limit(&self) -> RateLimit;

    /// Fetch the latest quote for a ticker.
    ///
    /// The returned sample is dated with the provider's market date, not the
    /// local wall clock.
    async fn get_latest_quote(&self, symbol: &str) -> Result<PriceSample, MarketDataError>;

    /// Fetch daily samples for `start..=end`.
    ///
    /// Implementations may return samples in any order; the client sorts and
    /// de-duplicates them.
    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceSample>, MarketDataError>;
}
