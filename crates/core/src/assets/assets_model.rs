//! Asset domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ASSET_DECIMALS, MAX_ASSET_DECIMALS};
use crate::errors::{Result, ValidationError};

/// Canonical ticker form: trimmed and upper-cased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Domain model representing one tradable instrument.
///
/// `ticker` is the identity. Assets are never hard-deleted; `is_active`
/// drops them out of scheduled ingestion and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub ticker: String,
    pub name: String,
    pub currency: String,
    pub market: String,
    pub decimals: i32,
    pub min_lot_size: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Asset {
    /// Round a price to this asset's display precision.
    pub fn round_price(&self, price: Decimal) -> Decimal {
        price.round_dp(self.decimals.max(0) as u32)
    }
}

/// Input model for registering an asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub market: String,
    pub decimals: Option<i32>,
    pub min_lot_size: Option<Decimal>,
}

impl NewAsset {
    pub fn new(ticker: &str, name: &str, currency: &str, market: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            currency: currency.to_string(),
            market: market.to_string(),
            decimals: None,
            min_lot_size: None,
        }
    }

    /// Validates the new asset data. Every failure rejects the whole request.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("ticker", &self.ticker),
            ("name", &self.name),
            ("currency", &self.currency),
            ("market", &self.market),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field.to_string()).into());
            }
        }
        if self.ticker.trim().chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidInput(format!(
                "Ticker '{}' must not contain whitespace",
                self.ticker.trim()
            ))
            .into());
        }
        validate_decimals(self.decimals)?;
        validate_min_lot_size(self.min_lot_size)?;
        Ok(())
    }

    /// Trimmed, upper-cased copy with defaults applied.
    pub fn normalized(&self) -> NewAsset {
        NewAsset {
            ticker: normalize_ticker(&self.ticker),
            name: self.name.trim().to_string(),
            currency: self.currency.trim().to_uppercase(),
            market: self.market.trim().to_uppercase(),
            decimals: Some(self.decimals.unwrap_or(DEFAULT_ASSET_DECIMALS)),
            min_lot_size: Some(self.min_lot_size.unwrap_or(Decimal::ONE)),
        }
    }
}

/// Admin metadata correction. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub market: Option<String>,
    pub decimals: Option<i32>,
    pub min_lot_size: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl AssetUpdate {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("currency", &self.currency),
            ("market", &self.market),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ValidationError::InvalidInput(format!(
                    "Field '{}' cannot be blank",
                    field
                ))
                .into());
            }
        }
        validate_decimals(self.decimals)?;
        validate_min_lot_size(self.min_lot_size)?;
        Ok(())
    }

    pub fn normalized(&self) -> AssetUpdate {
        AssetUpdate {
            name: self.name.as_ref().map(|v| v.trim().to_string()),
            currency: self.currency.as_ref().map(|v| v.trim().to_uppercase()),
            market: self.market.as_ref().map(|v| v.trim().to_uppercase()),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == AssetUpdate::default()
    }
}

fn validate_decimals(decimals: Option<i32>) -> Result<()> {
    match decimals {
        Some(d) if !(0..=MAX_ASSET_DECIMALS).contains(&d) => {
            Err(ValidationError::InvalidInput(format!(
                "decimals must be between 0 and {}, got {}",
                MAX_ASSET_DECIMALS, d
            ))
            .into())
        }
        _ => Ok(()),
    }
}

fn validate_min_lot_size(min_lot_size: Option<Decimal>) -> Result<()> {
    match min_lot_size {
        Some(lot) if lot <= Decimal::ZERO => Err(ValidationError::InvalidInput(format!(
            "minLotSize must be positive, got {}",
            lot
        ))
        .into()),
        _ => Ok(()),
    }
}

/// Result of an idempotent create.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpsert {
    pub asset: Asset,
    /// False when the ticker already existed and the stored record was returned unchanged.
    pub created: bool,
}
