//! Pulls quotes for a set of tickers and reconciles them into the price store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use simfolio_market_data::MarketDataClient;

use super::ingestion_model::{IngestionMode, IngestionRun, RunTrigger, TickerOutcome};
use crate::assets::{normalize_ticker, Asset, AssetServiceTrait};
use crate::constants::DEFAULT_WORKER_CONCURRENCY;
use crate::errors::Result;
use crate::quotes::{HistoricalPrice, QuoteStore};

const REASON_NOT_REGISTERED: &str = "not registered";
const REASON_RUN_ABORTED: &str = "run aborted";

pub struct IngestionPipeline {
    client: Arc<MarketDataClient>,
    assets: Arc<dyn AssetServiceTrait>,
    quotes: Arc<dyn QuoteStore>,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        client: Arc<MarketDataClient>,
        assets: Arc<dyn AssetServiceTrait>,
        quotes: Arc<dyn QuoteStore>,
    ) -> Self {
        Self {
            client,
            assets,
            quotes,
            concurrency: DEFAULT_WORKER_CONCURRENCY,
        }
    }

    /// Number of tickers processed concurrently within a run.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs `mode` over `tickers` and returns the finished run.
    pub async fn run_batch(
        &self,
        trigger: RunTrigger,
        tickers: &[String],
        mode: IngestionMode,
    ) -> IngestionRun {
        let mut run = IngestionRun::start(trigger, mode);
        self.execute(&mut run, tickers).await;
        run
    }

    /// Processes `tickers` into an already started run and finishes it.
    ///
    /// Per-ticker errors are recorded and the run continues. Storage or
    /// provider outages stop new tickers from starting and fail the run.
    pub async fn execute(&self, run: &mut IngestionRun, tickers: &[String]) {
        let tickers = dedup_tickers(tickers);
        let mode = run.mode;

        info!(
            "Ingestion run {} ({}) started: {} tickers, mode {:?}, source {}",
            run.id,
            run.trigger,
            tickers.len(),
            mode,
            self.client.provider_id()
        );

        let aborted = AtomicBool::new(false);
        let aborted = &aborted;

        let results: Vec<(String, Result<TickerOutcome>)> = stream::iter(tickers)
            .map(|ticker| async move {
                if aborted.load(Ordering::SeqCst) {
                    return (ticker, Ok(TickerOutcome::skipped(REASON_RUN_ABORTED)));
                }
                let result = self.ingest_ticker(&ticker, mode).await;
                if result.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                }
                (ticker, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut fatal: Option<String> = None;
        for (ticker, result) in results {
            match result {
                Ok(outcome) => run.record(ticker, outcome),
                Err(e) => {
                    error!("Ingestion run {} aborting at {}: {}", run.id, ticker, e);
                    let reason = e.to_string();
                    fatal.get_or_insert_with(|| reason.clone());
                    run.record(ticker, TickerOutcome::failed(reason));
                }
            }
        }

        match fatal {
            Some(reason) => run.abort(reason),
            None => run.finish(),
        }
        info!("{}", run.summary_line());
    }

    /// `Err` only for infrastructure failures that should stop the run.
    async fn ingest_ticker(&self, ticker: &str, mode: IngestionMode) -> Result<TickerOutcome> {
        let result = match self.assets.find_by_ticker(ticker) {
            Ok(Some(asset)) => match mode {
                IngestionMode::Incremental => self.ingest_latest(&asset).await,
                IngestionMode::FullBackfill { from, to } => {
                    self.ingest_series(&asset, from, to).await
                }
            },
            Ok(None) => {
                debug!("Skipping {}: not registered", ticker);
                return Ok(TickerOutcome::skipped(REASON_NOT_REGISTERED));
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_storage_unavailable() || e.is_provider_unreachable() => Err(e),
            Err(e) => {
                warn!("Ingestion failed for {}: {}", ticker, e);
                Ok(TickerOutcome::failed(e.to_string()))
            }
        }
    }

    async fn ingest_latest(&self, asset: &Asset) -> Result<TickerOutcome> {
        let sample = self.client.fetch_latest_quote(&asset.ticker).await?;
        if sample.currency != asset.currency {
            warn!(
                "{}: provider currency {} differs from registered {}",
                asset.ticker, sample.currency, asset.currency
            );
        }

        let price = HistoricalPrice::from_sample(&asset.ticker, &sample, self.client.provider_id());
        price.validate()?;

        if let Some(existing) = self.quotes.price_on(&asset.ticker, price.date)? {
            if existing.same_values(&price) {
                return Ok(TickerOutcome::Unchanged);
            }
        }

        self.quotes.upsert_price(&price).await?;
        debug!("{} {} close {}", asset.ticker, price.date, price.close);
        Ok(TickerOutcome::Updated { samples: 1 })
    }

    async fn ingest_series(
        &self,
        asset: &Asset,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TickerOutcome> {
        let samples = self
            .client
            .fetch_historical_series(&asset.ticker, from, to)
            .await?;

        let stored = self.quotes.range(&asset.ticker, from, to)?;
        let source = self.client.provider_id();

        let changed: Vec<HistoricalPrice> = samples
            .iter()
            .map(|sample| HistoricalPrice::from_sample(&asset.ticker, sample, source))
            .filter(|price| {
                !stored
                    .binary_search_by_key(&price.date, |p| p.date)
                    .map(|idx| stored[idx].same_values(price))
                    .unwrap_or(false)
            })
            .collect();

        if changed.is_empty() {
            return Ok(TickerOutcome::Unchanged);
        }

        let written = self.quotes.upsert_prices(&changed).await?;
        debug!(
            "{}: {} of {} samples written for {}..={}",
            asset.ticker,
            written,
            samples.len(),
            from,
            to
        );
        Ok(TickerOutcome::Updated { samples: written })
    }
}

/// Normalizes and de-duplicates, keeping first-seen order.
fn dedup_tickers(tickers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| normalize_ticker(t))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
