//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the client handles the error.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    /// This is a terminal error - retrying won't help.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No data available for the requested date range.
    /// The symbol exists but has no quotes in the specified period.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider failed on its side (5xx, dropped connection).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider refused the request (bad token, forbidden, bad request).
    #[error("Request rejected by {provider}: {message}")]
    Rejected {
        /// The provider that rejected the request
        provider: String,
        /// Status or message describing the rejection
        message: String,
    },

    /// The circuit breaker is open for this provider.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// Data validation failed.
    /// The provider returned a malformed or nonsensical response.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use simfolio_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "BRAPI".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_)
            | Self::NoDataForRange
            | Self::Rejected { .. }
            | Self::ValidationFailed { .. } => RetryClass::Never,

            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => RetryClass::WithBackoff,

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }

    /// True for throttling, timeouts and provider-side failures.
    pub fn is_transient(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }

    /// True when the provider as a whole should be treated as down.
    pub fn is_provider_unreachable(&self) -> bool {
        self.retry_class() == RetryClass::CircuitOpen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_never_retries() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert!(!error.is_transient());
    }

    #[test]
    fn test_malformed_response_never_retries() {
        let error = MarketDataError::ValidationFailed {
            message: "close must be positive".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);

        let error = MarketDataError::Rejected {
            provider: "BRAPI".to_string(),
            message: "401 Unauthorized".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_transient_errors_retry_with_backoff() {
        let errors = [
            MarketDataError::RateLimited {
                provider: "BRAPI".to_string(),
            },
            MarketDataError::Timeout {
                provider: "YAHOO".to_string(),
            },
            MarketDataError::ProviderError {
                provider: "YAHOO".to_string(),
                message: "HTTP error: 503 Service Unavailable".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::WithBackoff, "{error}");
            assert!(error.is_transient());
        }
    }

    #[test]
    fn test_circuit_open_is_unreachable() {
        let error = MarketDataError::CircuitOpen {
            provider: "BRAPI".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::CircuitOpen);
        assert!(error.is_provider_unreachable());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("XPTO3".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: XPTO3");

        let error = MarketDataError::RateLimited {
            provider: "BRAPI".to_string(),
        };
        assert_eq!(format!("{}", error), "Rate limited: BRAPI");

        let error = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "HTTP error: 502 Bad Gateway".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: YAHOO - HTTP error: 502 Bad Gateway"
        );
    }
}
