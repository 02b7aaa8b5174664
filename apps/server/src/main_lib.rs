use std::sync::Arc;

use simfolio_core::{
    assets::{AssetService, AssetServiceTrait},
    ingestion::IngestionPipeline,
    scheduler::Scheduler,
    search::SearchService,
};
use simfolio_market_data::{
    BrapiProvider, ClientConfig, MarketDataClient, MarketDataProvider, RetryPolicy, YahooProvider,
};
use simfolio_storage_sqlite::{AssetRepository, PriceRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, ProviderKind};

pub struct AppState {
    pub asset_service: Arc<dyn AssetServiceTrait>,
    pub search_service: Arc<SearchService>,
    pub scheduler: Arc<Scheduler>,
    pub cron_secret: Option<String>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("SIM_LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("text") {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    } else {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    }
}

/// Provider selected by `SIM_PROVIDER`.
pub fn build_provider(config: &Config) -> Arc<dyn MarketDataProvider> {
    match config.provider {
        ProviderKind::Brapi => {
            let token = config.provider_token.clone();
            match &config.provider_base_url {
                Some(url) => Arc::new(BrapiProvider::with_base_url(url.clone(), token)),
                None => Arc::new(BrapiProvider::new(token)),
            }
        }
        ProviderKind::Yahoo => match &config.provider_base_url {
            Some(url) => Arc::new(YahooProvider::with_base_url(
                url.clone(),
                config.yahoo_suffix.clone(),
            )),
            None => Arc::new(YahooProvider::new(config.yahoo_suffix.clone())),
        },
    }
}

fn client_config(config: &Config, provider: &dyn MarketDataProvider) -> ClientConfig {
    let rate_limit = config.provider_rpm.map(|rpm| {
        let mut limit = provider.rate_limit();
        limit.requests_per_minute = rpm.max(1);
        limit
    });
    ClientConfig {
        request_timeout: config.provider_timeout,
        retry: RetryPolicy::new(config.retry_max_attempts),
        rate_limit,
        ..ClientConfig::default()
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    build_state_with_provider(config, build_provider(config)).await
}

/// Wires storage, services and the scheduler around an explicit provider.
pub async fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn MarketDataProvider>,
) -> anyhow::Result<Arc<AppState>> {
    let database = simfolio_storage_sqlite::open(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let asset_repository = Arc::new(AssetRepository::new(
        database.pool.clone(),
        database.writer.clone(),
    ));
    let price_repository = Arc::new(PriceRepository::new(
        database.pool.clone(),
        database.writer.clone(),
    ));

    let asset_service: Arc<dyn AssetServiceTrait> = Arc::new(AssetService::new(asset_repository));

    let client_config = client_config(config, provider.as_ref());
    tracing::info!(
        provider = provider.id(),
        timeout_ms = client_config.request_timeout.as_millis() as u64,
        max_attempts = client_config.retry.max_attempts,
        "market data client configured"
    );
    let client = Arc::new(MarketDataClient::new(provider, client_config));

    let pipeline = Arc::new(
        IngestionPipeline::new(client, asset_service.clone(), price_repository.clone())
            .with_concurrency(config.worker_concurrency),
    );
    let scheduler = Arc::new(Scheduler::new(pipeline, asset_service.clone()));
    let search_service = Arc::new(SearchService::new(asset_service.clone(), price_repository));

    if config.cron_secret.is_none() {
        tracing::warn!("SIM_CRON_SECRET is not set; cron and sync endpoints will reject all calls");
    }

    Ok(Arc::new(AppState {
        asset_service,
        search_service,
        scheduler,
        cron_secret: config.cron_secret.clone(),
        db_path: config.db_path.clone(),
    }))
}
