use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::Asset;

/// An asset with its point-in-time price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub ticker: String,
    pub name: String,
    pub currency: String,
    pub market: String,
    pub decimals: i32,
    pub min_lot_size: Decimal,
    /// Close as of the requested date, `0` when no record exists.
    pub price: Decimal,
    /// Date of the record the price came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_date: Option<NaiveDate>,
}

impl SearchResultItem {
    pub fn from_asset(asset: Asset, price: Option<(Decimal, NaiveDate)>) -> Self {
        let (price, price_date) = match price {
            Some((close, date)) => (close, Some(date)),
            None => (Decimal::ZERO, None),
        };
        Self {
            ticker: asset.ticker,
            name: asset.name,
            currency: asset.currency,
            market: asset.market,
            decimals: asset.decimals,
            min_lot_size: asset.min_lot_size,
            price,
            price_date,
        }
    }
}
