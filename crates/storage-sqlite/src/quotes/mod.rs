//! SQLite storage implementation for historical prices.

mod model;
mod repository;

pub use model::HistoricalPriceDB;
pub use repository::PriceRepository;
