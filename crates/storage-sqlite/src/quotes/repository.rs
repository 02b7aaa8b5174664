use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use simfolio_core::quotes::{HistoricalPrice, QuoteStore};
use simfolio_core::Result;

use super::model::HistoricalPriceDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::historical_prices::dsl as prices_dsl;

// SQLite caps bound parameters per statement; 10 columns per row.
const UPSERT_CHUNK_SIZE: usize = 500;

pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn into_prices(rows: Vec<HistoricalPriceDB>) -> Result<Vec<HistoricalPrice>> {
    rows.into_iter().map(HistoricalPrice::try_from).collect()
}

#[async_trait]
impl QuoteStore for PriceRepository {
    async fn upsert_price(&self, price: &HistoricalPrice) -> Result<()> {
        let row = HistoricalPriceDB::from(price);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::replace_into(prices_dsl::historical_prices)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn upsert_prices(&self, prices: &[HistoricalPrice]) -> Result<usize> {
        if prices.is_empty() {
            return Ok(0);
        }
        let rows: Vec<HistoricalPriceDB> = prices.iter().map(HistoricalPriceDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut total = 0;
                for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
                    total += diesel::replace_into(prices_dsl::historical_prices)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(total)
            })
            .await
    }

    fn price_as_of(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>> {
        let mut conn = get_connection(&self.pool)?;

        let row = prices_dsl::historical_prices
            .select(HistoricalPriceDB::as_select())
            .filter(prices_dsl::ticker.eq(ticker))
            .filter(prices_dsl::date.le(date))
            .order(prices_dsl::date.desc())
            .first::<HistoricalPriceDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(HistoricalPrice::try_from).transpose()
    }

    fn price_on(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>> {
        let mut conn = get_connection(&self.pool)?;

        let row = prices_dsl::historical_prices
            .select(HistoricalPriceDB::as_select())
            .filter(prices_dsl::ticker.eq(ticker))
            .filter(prices_dsl::date.eq(date))
            .first::<HistoricalPriceDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(HistoricalPrice::try_from).transpose()
    }

    fn range(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoricalPrice>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = prices_dsl::historical_prices
            .select(HistoricalPriceDB::as_select())
            .filter(prices_dsl::ticker.eq(ticker))
            .filter(prices_dsl::date.ge(from))
            .filter(prices_dsl::date.le(to))
            .order(prices_dsl::date.asc())
            .load::<HistoricalPriceDB>(&mut conn)
            .into_core()?;

        into_prices(rows)
    }
}
