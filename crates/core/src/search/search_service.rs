use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::debug;

use super::search_model::SearchResultItem;
use crate::assets::{normalize_ticker, AssetServiceTrait};
use crate::constants::SEARCH_RESULT_LIMIT;
use crate::errors::{Result, ValidationError};
use crate::quotes::{HistoricalPrice, QuoteStore};

/// Read-only lookups over the registry and the price store.
pub struct SearchService {
    assets: Arc<dyn AssetServiceTrait>,
    quotes: Arc<dyn QuoteStore>,
}

impl SearchService {
    pub fn new(assets: Arc<dyn AssetServiceTrait>, quotes: Arc<dyn QuoteStore>) -> Self {
        Self { assets, quotes }
    }

    /// Assets matching `query`, each priced as of `simulation_date` (today when
    /// absent). Queries shorter than `min_length` characters return nothing.
    pub fn search(
        &self,
        query: &str,
        min_length: usize,
        simulation_date: Option<NaiveDate>,
    ) -> Result<Vec<SearchResultItem>> {
        let query = query.trim();
        if query.chars().count() < min_length {
            debug!("Search query '{}' below minimum length {}", query, min_length);
            return Ok(Vec::new());
        }

        let date = simulation_date.unwrap_or_else(|| Utc::now().date_naive());
        self.assets
            .search_by_text(query, SEARCH_RESULT_LIMIT)?
            .into_iter()
            .map(|asset| {
                let price = self
                    .quotes
                    .price_as_of(&asset.ticker, date)?
                    .map(|p| (p.close, p.date));
                Ok(SearchResultItem::from_asset(asset, price))
            })
            .collect()
    }

    /// Latest stored price on or before `date` (today when absent).
    pub fn price_as_of(&self, ticker: &str, date: Option<NaiveDate>) -> Result<Option<HistoricalPrice>> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        self.quotes.price_as_of(&normalize_ticker(ticker), date)
    }

    /// Stored series for `from..=to`, ascending.
    pub fn price_history(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HistoricalPrice>> {
        if from > to {
            return Err(ValidationError::InvalidInput(format!(
                "'from' ({}) must not be after 'to' ({})",
                from, to
            ))
            .into());
        }
        self.quotes.range(&normalize_ticker(ticker), from, to)
    }
}
