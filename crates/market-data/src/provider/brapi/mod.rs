//! brapi.dev provider implementation.
//!
//! Quotes and daily history for B3-listed instruments (stocks, FIIs, BDRs),
//! priced in BRL.
//!
//! # API Endpoints
//!
//! - Latest price: `https://brapi.dev/api/quote/{ticker}`
//! - Historical candles: `https://brapi.dev/api/quote/{ticker}?range={range}&interval=1d`
//!
//! The history endpoint only accepts named ranges (`1mo`, `1y`, `max`, ...),
//! so the smallest range covering the requested start date is chosen and the
//! result is filtered locally.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use log::warn;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::PriceSample;
use crate::provider::{check_status, transport_error, MarketDataProvider, RateLimit};

const DEFAULT_BASE_URL: &str = "https://brapi.dev/api";
const PROVIDER_ID: &str = "BRAPI";
const DEFAULT_CURRENCY: &str = "BRL";

/// B3 trades on Brasília time (UTC-3, no daylight saving since 2019).
const B3_UTC_OFFSET_SECS: i32 = -3 * 3600;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    #[serde(default)]
    results: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    symbol: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_open: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    /// ISO-8601 timestamp of the last trade
    #[serde(default)]
    regular_market_time: Option<String>,
    #[serde(default)]
    historical_data_price: Option<Vec<HistoricalBar>>,
}

#[derive(Debug, Deserialize)]
struct HistoricalBar {
    /// Unix seconds
    date: i64,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

/// Error body brapi returns alongside 4xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// brapi.dev provider for Brazilian market data.
pub struct BrapiProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BrapiProvider {
    /// Create a provider against the public endpoint.
    ///
    /// A handful of tickers (PETR4, VALE3, ITUB4, MGLU3) work without a
    /// token; everything else needs one.
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    async fn fetch(
        &self,
        symbol: &str,
        range: Option<&str>,
    ) -> Result<QuoteResponse, MarketDataError> {
        let mut url = format!("{}/quote/{}", self.base_url, urlencoding::encode(symbol));
        if let Some(range) = range {
            url.push_str(&format!("?range={}&interval=1d", range));
        }

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, e))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            // brapi answers unknown tickers with 400/404 and a message body
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            if message.to_lowercase().contains("encontramos") {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            return Err(MarketDataError::Rejected {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        let response = check_status(PROVIDER_ID, symbol, response)?;
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, e))?;

        parse_response(&text)
    }

    /// Smallest named range that reaches back to `start`.
    fn range_for(start: NaiveDate, today: NaiveDate) -> &'static str {
        let days = (today - start).num_days();
        match days {
            d if d <= 5 => "5d",
            d if d <= 31 => "1mo",
            d if d <= 92 => "3mo",
            d if d <= 183 => "6mo",
            d if d <= 366 => "1y",
            d if d <= 731 => "2y",
            d if d <= 1827 => "5y",
            d if d <= 3653 => "10y",
            _ => "max",
        }
    }
}

fn parse_response(text: &str) -> Result<QuoteResponse, MarketDataError> {
    serde_json::from_str(text).map_err(|e| MarketDataError::ValidationFailed {
        message: format!("Failed to parse {} response: {}", PROVIDER_ID, e),
    })
}

fn b3_offset() -> FixedOffset {
    FixedOffset::east_opt(B3_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn unix_to_market_date(ts: i64) -> Option<NaiveDate> {
    b3_offset().timestamp_opt(ts, 0).single().map(|dt| dt.date_naive())
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

fn display_name(result: &QuoteResult) -> Option<String> {
    result.long_name.clone().or_else(|| result.short_name.clone())
}

fn latest_sample(result: &QuoteResult) -> Result<PriceSample, MarketDataError> {
    let price = result
        .regular_market_price
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No price in {} response for {}", PROVIDER_ID, result.symbol),
        })?;
    let close = Decimal::from_f64(price).ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("Failed to convert price {} to Decimal", price),
    })?;

    let market_time = result
        .regular_market_time
        .as_deref()
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No market time in {} response", PROVIDER_ID),
        })?;
    let date = DateTime::parse_from_rfc3339(market_time)
        .map_err(|e| MarketDataError::ValidationFailed {
            message: format!("Invalid market time '{}': {}", market_time, e),
        })?
        .with_timezone(&b3_offset())
        .date_naive();

    let currency = result
        .currency
        .clone()
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Ok(PriceSample::new(date, close, currency)
        .with_ohlv(
            decimal(result.regular_market_open),
            decimal(result.regular_market_day_high),
            decimal(result.regular_market_day_low),
            decimal(result.regular_market_volume),
        )
        .with_display_name(display_name(result)))
}

fn historical_samples(
    result: &QuoteResult,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<PriceSample> {
    let currency = result
        .currency
        .clone()
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let name = display_name(result);

    let bars = result.historical_data_price.as_deref().unwrap_or_default();
    let mut samples = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let Some(date) = unix_to_market_date(bar.date) else {
            warn!("Skipping bar at index {}: invalid timestamp {}", i, bar.date);
            continue;
        };
        if date < start || date > end {
            continue;
        }
        let Some(close) = decimal(bar.close) else {
            warn!("Skipping bar at index {}: missing close for {}", i, date);
            continue;
        };
        samples.push(
            PriceSample::new(date, close, currency.clone())
                .with_ohlv(
                    decimal(bar.open),
                    decimal(bar.high),
                    decimal(bar.low),
                    decimal(bar.volume),
                )
                .with_display_name(name.clone()),
        );
    }
    samples
}

fn first_result(
    response: QuoteResponse,
    symbol: &str,
) -> Result<QuoteResult, MarketDataError> {
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
}

#[async_trait]
impl MarketDataProvider for BrapiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            max_concurrency: 4,
            min_delay: Duration::from_millis(250),
        }
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<PriceSample, MarketDataError> {
        let response = self.fetch(symbol, None).await?;
        let result = first_result(response, symbol)?;
        latest_sample(&result)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceSample>, MarketDataError> {
        let today = Utc::now().with_timezone(&b3_offset()).date_naive();
        let range = Self::range_for(start, today);

        let response = self.fetch(symbol, Some(range)).await?;
        let result = first_result(response, symbol)?;
        let samples = historical_samples(&result, start, end);

        if samples.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PETR4_FIXTURE: &str = r#"{
        "results": [{
            "symbol": "PETR4",
            "shortName": "PETROBRAS   PN      N2",
            "longName": "Petróleo Brasileiro S.A. - Petrobras",
            "currency": "BRL",
            "regularMarketPrice": 38.5,
            "regularMarketOpen": 38.1,
            "regularMarketDayHigh": 38.9,
            "regularMarketDayLow": 37.95,
            "regularMarketVolume": 41234500,
            "regularMarketTime": "2024-05-10T20:07:00.000Z",
            "historicalDataPrice": [
                {"date": 1715173200, "open": 37.2, "high": 37.9, "low": 37.0, "close": 37.5, "volume": 30000000},
                {"date": 1715259600, "open": 37.5, "high": 38.3, "low": 37.4, "close": 38.0, "volume": 35000000},
                {"date": 1715346000, "open": 38.1, "high": 38.9, "low": 37.95, "close": 38.5, "volume": 41234500}
            ]
        }],
        "requestedAt": "2024-05-11T02:00:00.000Z",
        "took": "0ms"
    }"#;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_provider_id_and_rate_limit() {
        let provider = BrapiProvider::new(None);
        assert_eq!(provider.id(), "BRAPI");
        assert_eq!(provider.rate_limit().max_concurrency, 4);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let provider = BrapiProvider::new(Some("  ".to_string()));
        assert!(provider.token.is_none());
    }

    #[test]
    fn test_latest_sample_uses_market_date_and_long_name() {
        let response = parse_response(PETR4_FIXTURE).unwrap();
        let result = first_result(response, "PETR4").unwrap();
        let sample = latest_sample(&result).unwrap();

        assert_eq!(sample.date, d(2024, 5, 10));
        assert_eq!(sample.close, dec!(38.5));
        assert_eq!(sample.currency, "BRL");
        assert_eq!(
            sample.display_name.as_deref(),
            Some("Petróleo Brasileiro S.A. - Petrobras")
        );
        assert_eq!(sample.high, Some(dec!(38.9)));
    }

    #[test]
    fn test_late_evening_utc_still_maps_to_b3_day() {
        // 2024-05-11T01:30Z is still 2024-05-10 in São Paulo
        let json = r#"{"results":[{"symbol":"VALE3","regularMarketPrice":61.2,
            "regularMarketTime":"2024-05-11T01:30:00.000Z"}]}"#;
        let result = first_result(parse_response(json).unwrap(), "VALE3").unwrap();
        let sample = latest_sample(&result).unwrap();
        assert_eq!(sample.date, d(2024, 5, 10));
        assert_eq!(sample.currency, "BRL");
    }

    #[test]
    fn test_historical_samples_filtered_to_range() {
        let result = first_result(parse_response(PETR4_FIXTURE).unwrap(), "PETR4").unwrap();

        let all = historical_samples(&result, d(2024, 1, 1), d(2024, 12, 31));
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, d(2024, 5, 8));
        assert_eq!(all[2].close, dec!(38.5));

        let subset = historical_samples(&result, d(2024, 5, 9), d(2024, 5, 9));
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].close, dec!(38.0));
    }

    #[test]
    fn test_missing_price_is_validation_failure() {
        let json = r#"{"results":[{"symbol":"XPTO3","regularMarketTime":"2024-05-10T20:00:00Z"}]}"#;
        let result = first_result(parse_response(json).unwrap(), "XPTO3").unwrap();
        let err = latest_sample(&result).unwrap_err();
        assert!(matches!(err, MarketDataError::ValidationFailed { .. }));
    }

    #[test]
    fn test_empty_results_is_not_found() {
        let response = parse_response(r#"{"results": []}"#).unwrap();
        let err = first_result(response, "XPTO3").unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(s) if s == "XPTO3"));
    }

    #[test]
    fn test_malformed_body_is_validation_failure() {
        let err = parse_response("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, MarketDataError::ValidationFailed { .. }));
    }

    #[test]
    fn test_range_selection() {
        let today = d(2024, 5, 10);
        assert_eq!(BrapiProvider::range_for(d(2024, 5, 8), today), "5d");
        assert_eq!(BrapiProvider::range_for(d(2024, 1, 1), today), "6mo");
        assert_eq!(BrapiProvider::range_for(d(2023, 6, 1), today), "1y");
        assert_eq!(BrapiProvider::range_for(d(2004, 5, 10), today), "max");
    }
}
