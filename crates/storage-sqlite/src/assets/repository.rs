use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use simfolio_core::assets::{Asset, AssetRepositoryTrait, AssetUpdate, NewAsset};
use simfolio_core::Result;

use super::model::{search_name, AssetDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::assets;

/// Repository for managing asset data in the database
pub struct AssetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AssetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl AssetRepositoryTrait for AssetRepository {
    async fn create_if_absent(&self, new_asset: NewAsset) -> Result<(Asset, bool)> {
        let row = AssetDB::from_new(new_asset, Utc::now().naive_utc());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<(Asset, bool)> {
                let existing = assets::table
                    .find(&row.ticker)
                    .select(AssetDB::as_select())
                    .first::<AssetDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                if let Some(existing) = existing {
                    return Ok((existing.into(), false));
                }

                diesel::insert_into(assets::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok((row.into(), true))
            })
            .await
    }

    async fn update(&self, ticker: &str, update: AssetUpdate) -> Result<Asset> {
        let ticker = ticker.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Asset> {
                let mut row = assets::table
                    .find(&ticker)
                    .select(AssetDB::as_select())
                    .first::<AssetDB>(conn)
                    .map_err(StorageError::from)?;

                if let Some(name) = update.name {
                    row.search_name = search_name(&name);
                    row.name = name;
                }
                if let Some(currency) = update.currency {
                    row.currency = currency;
                }
                if let Some(market) = update.market {
                    row.market = market;
                }
                if let Some(decimals) = update.decimals {
                    row.decimals = decimals;
                }
                if let Some(lot) = update.min_lot_size {
                    row.min_lot_size = lot.to_string();
                }
                if let Some(active) = update.is_active {
                    row.is_active = active;
                }
                row.updated_at = Utc::now().naive_utc();

                diesel::update(assets::table.find(&ticker))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(row.into())
            })
            .await
    }

    fn get_by_ticker(&self, ticker: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;

        let row = assets::table
            .find(ticker)
            .select(AssetDB::as_select())
            .first::<AssetDB>(&mut conn)
            .into_core()?;
        Ok(row.into())
    }

    fn list(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = assets::table
            .select(AssetDB::as_select())
            .order(assets::ticker.asc())
            .load::<AssetDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    fn list_active(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = assets::table
            .select(AssetDB::as_select())
            .filter(assets::is_active.eq(true))
            .order(assets::ticker.asc())
            .load::<AssetDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    fn search_by_text(&self, query: &str, limit: usize) -> Result<Vec<Asset>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let prefix = format!("{}%", escape_like(&query.to_uppercase()));
        let contains = format!("%{}%", escape_like(&search_name(query)));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        // Tickers are stored upper-cased ASCII. Names match through
        // `search_name`, folded in Rust so accented letters compare too.
        let mut rows = assets::table
            .select(AssetDB::as_select())
            .filter(assets::is_active.eq(true))
            .filter(assets::ticker.like(&prefix).escape('\\'))
            .order(assets::ticker.asc())
            .limit(limit)
            .load::<AssetDB>(&mut conn)
            .into_core()?;

        let remaining = limit - rows.len() as i64;
        if remaining > 0 {
            let by_name = assets::table
                .select(AssetDB::as_select())
                .filter(assets::is_active.eq(true))
                .filter(assets::ticker.not_like(&prefix).escape('\\'))
                .filter(assets::search_name.like(&contains).escape('\\'))
                .order(assets::name.asc())
                .limit(remaining)
                .load::<AssetDB>(&mut conn)
                .into_core()?;
            rows.extend(by_name);
        }

        Ok(rows.into_iter().map(Asset::from).collect())
    }
}
