//! Simfolio Market Data Crate
//!
//! Provider adapters and the request discipline around them.
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! |  MarketDataClient  |  circuit breaker, concurrency cap, token bucket,
//! +--------------------+  timeout, retry with backoff, normalization
//!           |
//!           v
//! +--------------------+
//! | MarketDataProvider |  (brapi, Yahoo) one HTTP call -> PriceSample
//! +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`PriceSample`] - The normalized quote every provider returns
//! - [`MarketDataError`] - Error taxonomy with retry classification
//! - [`MarketDataClient`] - What the rest of the system talks to

pub mod client;
pub mod errors;
pub mod models;
pub mod provider;

pub use client::{
    Backoff, CircuitBreakerConfig, CircuitState, ClientConfig, MarketDataClient, RetryPolicy,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use errors::{MarketDataError, RetryClass};
pub use models::PriceSample;
pub use provider::brapi::BrapiProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, RateLimit};
