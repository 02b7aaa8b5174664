//! Database model for assets.

use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;

use simfolio_core::assets::{Asset, NewAsset};
use simfolio_core::constants::DEFAULT_ASSET_DECIMALS;

/// Database model for assets
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(primary_key(ticker))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetDB {
    pub ticker: String,
    pub name: String,
    /// `name` lower-cased in Rust, since SQLite folds case for ASCII only.
    pub search_name: String,
    pub currency: String,
    pub market: String,
    pub decimals: i32,
    pub min_lot_size: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AssetDB> for Asset {
    fn from(db: AssetDB) -> Self {
        Asset {
            min_lot_size: Decimal::from_str(&db.min_lot_size).unwrap_or(Decimal::ONE),
            ticker: db.ticker,
            name: db.name,
            currency: db.currency,
            market: db.market,
            decimals: db.decimals,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Case-folded form of an asset name used for substring search.
pub fn search_name(name: &str) -> String {
    name.to_lowercase()
}

impl AssetDB {
    /// Row for an already normalized `NewAsset`.
    pub fn from_new(asset: NewAsset, now: NaiveDateTime) -> Self {
        AssetDB {
            ticker: asset.ticker,
            search_name: search_name(&asset.name),
            name: asset.name,
            currency: asset.currency,
            market: asset.market,
            decimals: asset.decimals.unwrap_or(DEFAULT_ASSET_DECIMALS),
            min_lot_size: asset.min_lot_size.unwrap_or(Decimal::ONE).to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
