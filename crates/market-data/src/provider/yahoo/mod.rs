//! Yahoo Finance market data provider.
//!
//! Uses the public v8 chart endpoint for both the latest quote (chart
//! metadata) and daily history (chart arrays). Tickers are suffixed with
//! the configured exchange suffix, so `PETR4` is requested as `PETR4.SA`
//! when the provider is built with `.SA`.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use reqwest::{header, Client};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::PriceSample;
use crate::provider::{check_status, transport_error, MarketDataProvider, RateLimit};

use models::{YahooChartResponse, YahooChartResult, YahooQuoteSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "YAHOO";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Yahoo Finance market data provider.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    symbol_suffix: String,
}

impl YahooProvider {
    /// Create a provider with an exchange suffix appended to every ticker
    /// (empty for US listings, `.SA` for B3, `.TO` for Toronto, ...).
    pub fn new(symbol_suffix: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, symbol_suffix)
    }

    pub fn with_base_url(base_url: impl Into<String>, symbol_suffix: impl Into<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol_suffix: symbol_suffix.into(),
        }
    }

    fn provider_symbol(&self, symbol: &str) -> String {
        if self.symbol_suffix.is_empty() || symbol.ends_with(&self.symbol_suffix) {
            symbol.to_string()
        } else {
            format!("{}{}", symbol, self.symbol_suffix)
        }
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<YahooChartResult, MarketDataError> {
        let provider_symbol = self.provider_symbol(symbol);
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(&provider_symbol)
        );
        debug!("Fetching Yahoo chart for {}", provider_symbol);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, e))?;
        let response = check_status(PROVIDER_ID, symbol, response)?;
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, e))?;

        parse_chart(&text, symbol)
    }
}

fn parse_chart(text: &str, symbol: &str) -> Result<YahooChartResult, MarketDataError> {
    let parsed: YahooChartResponse =
        serde_json::from_str(text).map_err(|e| MarketDataError::ValidationFailed {
            message: format!("Failed to parse {} response: {}", PROVIDER_ID, e),
        })?;

    if let Some(error) = parsed.chart.error {
        let code = error.code.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        return Err(MarketDataError::Rejected {
            provider: PROVIDER_ID.to_string(),
            message: error.description.unwrap_or(code),
        });
    }

    parsed
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

fn market_date(ts: i64, gmtoffset: i32) -> Option<NaiveDate> {
    Utc.timestamp_opt(ts + i64::from(gmtoffset), 0)
        .single()
        .map(|dt| dt.date_naive())
}

fn latest_sample(result: &YahooChartResult, symbol: &str) -> Result<PriceSample, MarketDataError> {
    let meta = &result.meta;
    let price = meta
        .regular_market_price
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No price in {} response for {}", PROVIDER_ID, symbol),
        })?;
    let close = Decimal::from_f64(price).ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("Failed to convert price {} to Decimal", price),
    })?;
    let date = meta
        .regular_market_time
        .and_then(|ts| market_date(ts, meta.gmtoffset))
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No market time in {} response for {}", PROVIDER_ID, symbol),
        })?;
    let currency = meta
        .currency
        .clone()
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No currency in {} response for {}", PROVIDER_ID, symbol),
        })?;

    Ok(PriceSample::new(date, close, currency)
        .with_ohlv(
            None,
            decimal(meta.regular_market_day_high),
            decimal(meta.regular_market_day_low),
            decimal(meta.regular_market_volume),
        )
        .with_display_name(meta.long_name.clone().or_else(|| meta.short_name.clone())))
}

fn historical_samples(
    result: &YahooChartResult,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceSample>, MarketDataError> {
    let meta = &result.meta;
    let currency = meta
        .currency
        .clone()
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No currency in {} chart response", PROVIDER_ID),
        })?;
    let name = meta.long_name.clone().or_else(|| meta.short_name.clone());

    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let empty = YahooQuoteSeries::default();
    let series = result
        .indicators
        .as_ref()
        .and_then(|i| i.quote.first())
        .unwrap_or(&empty);

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut samples = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = market_date(*ts, meta.gmtoffset) else {
            warn!("Skipping Yahoo bar at index {}: invalid timestamp {}", i, ts);
            continue;
        };
        if date < start || date > end {
            continue;
        }
        let Some(close) = decimal(at(&series.close, i)) else {
            debug!("Skipping Yahoo bar for {}: no close", date);
            continue;
        };
        samples.push(
            PriceSample::new(date, close, currency.clone())
                .with_ohlv(
                    decimal(at(&series.open, i)),
                    decimal(at(&series.high, i)),
                    decimal(at(&series.low, i)),
                    decimal(at(&series.volume, i)),
                )
                .with_display_name(name.clone()),
        );
    }
    Ok(samples)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            max_concurrency: 6,
            min_delay: Duration::from_millis(50),
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<PriceSample, MarketDataError> {
        let result = self
            .fetch_chart(
                symbol,
                &[("range", "5d".to_string()), ("interval", "1d".to_string())],
            )
            .await?;
        latest_sample(&result, symbol)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceSample>, MarketDataError> {
        // period2 is exclusive
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let result = self
            .fetch_chart(
                symbol,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "history".to_string()),
                ],
            )
            .await?;

        let samples = historical_samples(&result, start, end)?;
        if samples.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        Ok(samples)
    }
}
