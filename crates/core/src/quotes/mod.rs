//! Quotes module - the point-in-time historical price store.

mod model;
mod store;

pub use model::HistoricalPrice;
pub use store::QuoteStore;
