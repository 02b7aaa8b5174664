//! Database model for historical prices.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use simfolio_core::errors::Error;
use simfolio_core::quotes::HistoricalPrice;

/// Decimals are stored as text to keep full precision.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::historical_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoricalPriceDB {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: String,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub volume: Option<String>,
    pub currency: String,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<&HistoricalPrice> for HistoricalPriceDB {
    fn from(price: &HistoricalPrice) -> Self {
        HistoricalPriceDB {
            ticker: price.ticker.clone(),
            date: price.date,
            close: price.close.to_string(),
            open: price.open.map(|v| v.to_string()),
            high: price.high.map(|v| v.to_string()),
            low: price.low.map(|v| v.to_string()),
            volume: price.volume.map(|v| v.to_string()),
            currency: price.currency.clone(),
            source: price.source.clone(),
            updated_at: price.updated_at,
        }
    }
}

fn parse_optional(value: Option<String>) -> Result<Option<Decimal>, Error> {
    value
        .map(|v| Decimal::from_str(&v))
        .transpose()
        .map_err(Error::from)
}

impl TryFrom<HistoricalPriceDB> for HistoricalPrice {
    type Error = Error;

    fn try_from(db: HistoricalPriceDB) -> Result<Self, Self::Error> {
        Ok(HistoricalPrice {
            close: Decimal::from_str(&db.close)?,
            open: parse_optional(db.open)?,
            high: parse_optional(db.high)?,
            low: parse_optional(db.low)?,
            volume: parse_optional(db.volume)?,
            ticker: db.ticker,
            date: db.date,
            currency: db.currency,
            source: db.source,
            updated_at: db.updated_at,
        })
    }
}
