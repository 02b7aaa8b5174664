//! Search module - asset lookup priced at a (possibly simulated) date.

mod search_model;
mod search_service;

pub use search_model::SearchResultItem;
pub use search_service::SearchService;
