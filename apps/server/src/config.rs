use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;

/// Which market data provider backs the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Brapi,
    Yahoo,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brapi" => Ok(ProviderKind::Brapi),
            "yahoo" => Ok(ProviderKind::Yahoo),
            other => anyhow::bail!("Unknown provider '{}', expected 'brapi' or 'yahoo'", other),
        }
    }
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Shared bearer secret for the cron and sync endpoints. `None` rejects
    /// every call.
    pub cron_secret: Option<String>,
    pub provider: ProviderKind,
    pub provider_token: Option<String>,
    pub provider_base_url: Option<String>,
    /// Exchange suffix for Yahoo symbols (`.SA` for B3).
    pub yahoo_suffix: String,
    pub provider_rpm: Option<u32>,
    pub provider_timeout: Duration,
    pub retry_max_attempts: u32,
    pub worker_concurrency: usize,
    pub daily_sync_enabled: bool,
    pub daily_sync_hour_utc: u32,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/app.db".to_string(),
            cron_secret: None,
            provider: ProviderKind::Brapi,
            provider_token: None,
            provider_base_url: None,
            yahoo_suffix: ".SA".to_string(),
            provider_rpm: None,
            provider_timeout: Duration::from_millis(15_000),
            retry_max_attempts: 3,
            worker_concurrency: 4,
            daily_sync_enabled: false,
            daily_sync_hour_utc: 22,
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(120_000),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_opt(key)
        .map(|v| v.parse::<T>().with_context(|| format!("Invalid {}", key)))
        .transpose()
}

impl Config {
    /// Reads `SIM_*` variables, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let provider = match env_opt("SIM_PROVIDER") {
            Some(value) => value.parse()?,
            None => defaults.provider,
        };

        let daily_sync_hour_utc = env_parse::<u32>("SIM_DAILY_SYNC_HOUR_UTC")?
            .unwrap_or(defaults.daily_sync_hour_utc);
        if daily_sync_hour_utc > 23 {
            anyhow::bail!("SIM_DAILY_SYNC_HOUR_UTC must be between 0 and 23");
        }

        let cors_allow = env_opt("SIM_CORS_ALLOW_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allow);

        Ok(Self {
            listen_addr: env_parse("SIM_LISTEN_ADDR")?.unwrap_or(defaults.listen_addr),
            db_path: env_opt("SIM_DB_PATH").unwrap_or(defaults.db_path),
            cron_secret: env_opt("SIM_CRON_SECRET"),
            provider,
            provider_token: env_opt("SIM_PROVIDER_TOKEN"),
            provider_base_url: env_opt("SIM_PROVIDER_BASE_URL"),
            yahoo_suffix: std::env::var("SIM_YAHOO_SUFFIX")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.yahoo_suffix),
            provider_rpm: env_parse("SIM_PROVIDER_RPM")?,
            provider_timeout: env_parse("SIM_PROVIDER_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.provider_timeout),
            retry_max_attempts: env_parse("SIM_RETRY_MAX_ATTEMPTS")?
                .unwrap_or(defaults.retry_max_attempts),
            worker_concurrency: env_parse::<usize>("SIM_WORKER_CONCURRENCY")?
                .unwrap_or(defaults.worker_concurrency)
                .max(1),
            daily_sync_enabled: env_parse("SIM_DAILY_SYNC_ENABLED")?
                .unwrap_or(defaults.daily_sync_enabled),
            daily_sync_hour_utc,
            cors_allow,
            request_timeout: env_parse("SIM_REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
        })
    }
}
