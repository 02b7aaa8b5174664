//! Historical price storage trait.
//!
//! # Method Naming Convention
//!
//! - `upsert_*` - Insert or overwrite by `(ticker, date)`
//! - `price_*` - Single-record lookups
//! - `range` - Records within a date range, ascending

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::model::HistoricalPrice;
use crate::errors::Result;

/// Storage interface for historical prices.
///
/// Async methods are used for writes, which go through the single writer;
/// reads are sync and run on a pooled connection.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Inserts or overwrites the record for `(price.ticker, price.date)`.
    async fn upsert_price(&self, price: &HistoricalPrice) -> Result<()>;

    /// Upserts a batch in one short write transaction. Returns the number of
    /// rows written.
    async fn upsert_prices(&self, prices: &[HistoricalPrice]) -> Result<usize>;

    /// Latest record with `record.date <= date`.
    fn price_as_of(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>>;

    /// Record for exactly `date`.
    fn price_on(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>>;

    /// Records with `from <= date <= to`, ascending by date.
    fn range(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoricalPrice>>;

    /// `price_as_of(ticker, today)`.
    fn latest_price(&self, ticker: &str) -> Result<Option<HistoricalPrice>> {
        self.price_as_of(ticker, Utc::now().date_naive())
    }
}
