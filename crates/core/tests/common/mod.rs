//! In-memory fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use simfolio_core::assets::{
    Asset, AssetRepositoryTrait, AssetService, AssetServiceTrait, AssetUpdate, NewAsset,
};
use simfolio_core::errors::{DatabaseError, Result};
use simfolio_core::ingestion::IngestionPipeline;
use simfolio_core::quotes::{HistoricalPrice, QuoteStore};
use simfolio_core::scheduler::Scheduler;
use simfolio_core::search::SearchService;
use simfolio_market_data::{
    Backoff, CircuitBreakerConfig, ClientConfig, MarketDataClient, MarketDataError,
    MarketDataProvider, PriceSample, RateLimit, RetryPolicy,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Asset repository
// =============================================================================

#[derive(Default)]
pub struct InMemoryAssetRepository {
    assets: Mutex<BTreeMap<String, Asset>>,
}

#[async_trait]
impl AssetRepositoryTrait for InMemoryAssetRepository {
    async fn create_if_absent(&self, new_asset: NewAsset) -> Result<(Asset, bool)> {
        let mut assets = self.assets.lock().unwrap();
        if let Some(existing) = assets.get(&new_asset.ticker) {
            return Ok((existing.clone(), false));
        }
        let now = Utc::now().naive_utc();
        let asset = Asset {
            ticker: new_asset.ticker.clone(),
            name: new_asset.name,
            currency: new_asset.currency,
            market: new_asset.market,
            decimals: new_asset.decimals.unwrap_or(2),
            min_lot_size: new_asset.min_lot_size.unwrap_or(Decimal::ONE),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assets.insert(new_asset.ticker, asset.clone());
        Ok((asset, true))
    }

    async fn update(&self, ticker: &str, update: AssetUpdate) -> Result<Asset> {
        let mut assets = self.assets.lock().unwrap();
        let asset = assets
            .get_mut(ticker)
            .ok_or_else(|| DatabaseError::NotFound(ticker.to_string()))?;
        if let Some(name) = update.name {
            asset.name = name;
        }
        if let Some(currency) = update.currency {
            asset.currency = currency;
        }
        if let Some(market) = update.market {
            asset.market = market;
        }
        if let Some(decimals) = update.decimals {
            asset.decimals = decimals;
        }
        if let Some(lot) = update.min_lot_size {
            asset.min_lot_size = lot;
        }
        if let Some(active) = update.is_active {
            asset.is_active = active;
        }
        asset.updated_at = Utc::now().naive_utc();
        Ok(asset.clone())
    }

    fn get_by_ticker(&self, ticker: &str) -> Result<Asset> {
        self.assets
            .lock()
            .unwrap()
            .get(ticker)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(ticker.to_string()).into())
    }

    fn list(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.lock().unwrap().values().cloned().collect())
    }

    fn list_active(&self) -> Result<Vec<Asset>> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    fn search_by_text(&self, query: &str, limit: usize) -> Result<Vec<Asset>> {
        let q = query.to_uppercase();
        let assets = self.assets.lock().unwrap();
        let active: Vec<&Asset> = assets.values().filter(|a| a.is_active).collect();

        let mut results: Vec<Asset> = active
            .iter()
            .filter(|a| a.ticker.starts_with(&q))
            .map(|a| (*a).clone())
            .collect();

        let mut by_name: Vec<Asset> = active
            .iter()
            .filter(|a| !a.ticker.starts_with(&q) && a.name.to_uppercase().contains(&q))
            .map(|a| (*a).clone())
            .collect();
        by_name.sort_by(|a, b| a.name.cmp(&b.name));

        results.extend(by_name);
        results.truncate(limit);
        Ok(results)
    }
}

// =============================================================================
// Quote store
// =============================================================================

#[derive(Default)]
pub struct InMemoryQuoteStore {
    prices: Mutex<BTreeMap<(String, NaiveDate), HistoricalPrice>>,
    writer_down: AtomicBool,
}

impl InMemoryQuoteStore {
    /// Makes every write fail as if the database writer were gone.
    pub fn take_writer_down(&self) {
        self.writer_down.store(true, Ordering::SeqCst);
    }

    pub fn count(&self, ticker: &str) -> usize {
        self.prices
            .lock()
            .unwrap()
            .keys()
            .filter(|(t, _)| t == ticker)
            .count()
    }

    fn check_writer(&self) -> Result<()> {
        if self.writer_down.load(Ordering::SeqCst) {
            return Err(DatabaseError::WriterUnavailable("writer task stopped".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn upsert_price(&self, price: &HistoricalPrice) -> Result<()> {
        self.check_writer()?;
        self.prices
            .lock()
            .unwrap()
            .insert((price.ticker.clone(), price.date), price.clone());
        Ok(())
    }

    async fn upsert_prices(&self, prices: &[HistoricalPrice]) -> Result<usize> {
        self.check_writer()?;
        let mut stored = self.prices.lock().unwrap();
        for price in prices {
            stored.insert((price.ticker.clone(), price.date), price.clone());
        }
        Ok(prices.len())
    }

    fn price_as_of(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>> {
        Ok(self
            .prices
            .lock()
            .unwrap()
            .range((ticker.to_string(), NaiveDate::MIN)..=(ticker.to_string(), date))
            .next_back()
            .map(|(_, p)| p.clone()))
    }

    fn price_on(&self, ticker: &str, date: NaiveDate) -> Result<Option<HistoricalPrice>> {
        Ok(self
            .prices
            .lock()
            .unwrap()
            .get(&(ticker.to_string(), date))
            .cloned())
    }

    fn range(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<HistoricalPrice>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .prices
            .lock()
            .unwrap()
            .range((ticker.to_string(), from)..=(ticker.to_string(), to))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

// =============================================================================
// Provider
// =============================================================================

/// What the fake provider answers for a ticker.
#[derive(Clone, Debug)]
pub enum Script {
    Quote { date: NaiveDate, close: Decimal },
    Series(Vec<(NaiveDate, Decimal)>),
    NotFound,
    Timeout,
}

/// Provider answering from a per-ticker script. Optionally blocks every call
/// until the gate is opened.
pub struct FakeProvider {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn script(&self, ticker: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(ticker.to_string(), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, symbol: &str) -> std::result::Result<Script, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let script = self.scripts.lock().unwrap().get(symbol).cloned();
        match script {
            Some(Script::NotFound) | None => Err(MarketDataError::SymbolNotFound(symbol.to_string())),
            Some(Script::Timeout) => Err(MarketDataError::Timeout {
                provider: "FAKE".to_string(),
            }),
            Some(script) => Ok(script),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    fn id(&self) -> &'static str {
        "FAKE"
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60_000,
            max_concurrency: 16,
            min_delay: Duration::ZERO,
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> std::result::Result<PriceSample, MarketDataError> {
        match self.answer(symbol).await? {
            Script::Quote { date, close } => Ok(PriceSample::new(date, close, "BRL")),
            Script::Series(points) => points
                .last()
                .map(|(date, close)| PriceSample::new(*date, *close, "BRL"))
                .ok_or(MarketDataError::NoDataForRange),
            _ => Err(MarketDataError::NoDataForRange),
        }
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> std::result::Result<Vec<PriceSample>, MarketDataError> {
        match self.answer(symbol).await? {
            Script::Series(points) => Ok(points
                .into_iter()
                .map(|(date, close)| PriceSample::new(date, close, "BRL"))
                .collect()),
            Script::Quote { date, close } => Ok(vec![PriceSample::new(date, close, "BRL")]),
            _ => Err(MarketDataError::NoDataForRange),
        }
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        request_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts: 1,
            backoff: Backoff {
                base: Duration::from_millis(1),
                factor: 2.0,
                max: Duration::from_millis(5),
                jitter: false,
            },
        },
        circuit_breaker: CircuitBreakerConfig::default(),
        rate_limit: None,
    }
}

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub assets: Arc<dyn AssetServiceTrait>,
    pub quotes: Arc<InMemoryQuoteStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub scheduler: Arc<Scheduler>,
    pub search: SearchService,
}

impl Harness {
    pub fn new(provider: FakeProvider) -> Self {
        Self::with_config(provider, fast_client_config(), 4)
    }

    pub fn with_config(provider: FakeProvider, config: ClientConfig, concurrency: usize) -> Self {
        let provider = Arc::new(provider);
        let client = Arc::new(MarketDataClient::new(provider.clone(), config));
        let assets: Arc<dyn AssetServiceTrait> =
            Arc::new(AssetService::new(Arc::new(InMemoryAssetRepository::default())));
        let quotes = Arc::new(InMemoryQuoteStore::default());
        let pipeline = Arc::new(
            IngestionPipeline::new(client, assets.clone(), quotes.clone())
                .with_concurrency(concurrency),
        );
        let scheduler = Arc::new(Scheduler::new(pipeline.clone(), assets.clone()));
        let search = SearchService::new(assets.clone(), quotes.clone());

        Self {
            provider,
            assets,
            quotes,
            pipeline,
            scheduler,
            search,
        }
    }

    pub async fn register(&self, ticker: &str, name: &str) -> Asset {
        self.assets
            .upsert_asset(NewAsset::new(ticker, name, "BRL", "B3"))
            .await
            .unwrap()
            .asset
    }
}
