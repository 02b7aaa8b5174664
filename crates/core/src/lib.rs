//! Simfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the market-data synchronization logic: the asset
//! registry, the point-in-time price store contract, ingestion runs and
//! their scheduler, and search. It is database-agnostic and defines traits
//! that are implemented by the `storage-sqlite` crate.

pub mod assets;
pub mod constants;
pub mod errors;
pub mod ingestion;
pub mod quotes;
pub mod scheduler;
pub mod search;

// Re-export common types from the asset module
pub use assets::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
