//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Rate limiting configuration advertised by each provider
//! - Concrete provider implementations (brapi, Yahoo)
//!
//! Providers are thin translation layers: one HTTP call in, [`PriceSample`]s
//! out. Pacing, retries and circuit breaking live in
//! [`MarketDataClient`](crate::MarketDataClient).
//!
//! [`PriceSample`]: crate::PriceSample

mod rate_limit;
mod traits;

pub mod brapi;
pub mod yahoo;

pub use rate_limit::RateLimit;
pub use traits::MarketDataProvider;

use crate::errors::MarketDataError;
use reqwest::{Response, StatusCode};

/// Map an HTTP response status onto the error taxonomy.
///
/// 404 means the symbol is unknown, 429 is throttling, 5xx is transient and
/// any other non-success status is a rejection that retrying won't fix.
pub(crate) fn check_status(
    provider: &str,
    symbol: &str,
    response: Response,
) -> Result<Response, MarketDataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::NOT_FOUND => Err(MarketDataError::SymbolNotFound(symbol.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        }),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            Err(MarketDataError::Timeout {
                provider: provider.to_string(),
            })
        }
        s if s.is_server_error() => Err(MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP error: {}", s),
        }),
        s => Err(MarketDataError::Rejected {
            provider: provider.to_string(),
            message: format!("HTTP error: {}", s),
        }),
    }
}

/// Classify a transport-level reqwest failure.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> MarketDataError {
    if err.is_timeout() {
        MarketDataError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}
