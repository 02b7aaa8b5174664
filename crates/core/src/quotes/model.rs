//! Historical price domain model.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simfolio_market_data::PriceSample;

use crate::errors::{Result, ValidationError};

/// One asset's closing price on one calendar date.
///
/// Keyed by `(ticker, date)`. `close` keeps the precision the provider sent;
/// rounding to the asset's `decimals` is left to presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPrice {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub currency: String,
    /// Provider id the record came from (BRAPI, YAHOO, ...)
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl HistoricalPrice {
    pub fn new(ticker: &str, date: NaiveDate, close: Decimal, currency: &str, source: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
            currency: currency.to_string(),
            source: source.to_string(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn from_sample(ticker: &str, sample: &PriceSample, source: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            date: sample.date,
            close: sample.close,
            open: sample.open,
            high: sample.high,
            low: sample.low,
            volume: sample.volume,
            currency: sample.currency.clone(),
            source: source.to_string(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ValidationError::MissingField("ticker".to_string()).into());
        }
        if self.close <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "close must be positive for {} on {}, got {}",
                self.ticker, self.date, self.close
            ))
            .into());
        }
        Ok(())
    }

    /// Whether `other` carries the same market values (ignores source and
    /// timestamps).
    pub fn same_values(&self, other: &HistoricalPrice) -> bool {
        self.ticker == other.ticker
            && self.date == other.date
            && self.close == other.close
            && self.open == other.open
            && self.high == other.high
            && self.low == other.low
            && self.volume == other.volume
            && self.currency == other.currency
    }
}
