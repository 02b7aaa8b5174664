//! Error types shared by the registry, the price store and ingestion.
//!
//! Storage crates convert their driver errors into [`DatabaseError`] so that
//! nothing above them depends on Diesel or SQLite.

use thiserror::Error;

pub use simfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Another ingestion run holds the scheduler.
    #[error("An ingestion run is already in progress (run {run_id})")]
    RunInProgress { run_id: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Whether the persistence layer itself is unreachable, as opposed to a
    /// single query failing.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Database(
                DatabaseError::ConnectionFailed(_)
                    | DatabaseError::PoolCreationFailed(_)
                    | DatabaseError::WriterUnavailable(_)
            )
        )
    }

    /// Whether the market data provider is treated as down for this run.
    pub fn is_provider_unreachable(&self) -> bool {
        matches!(self, Error::MarketData(e) if e.is_provider_unreachable())
    }
}

/// Storage failures, carried as strings.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// The single writer task is gone.
    #[error("Database writer unavailable: {0}")]
    WriterUnavailable(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate primary key.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Usually a price written for a ticker that is not registered.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Rejected input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_unavailable_classification() {
        let down = Error::Database(DatabaseError::ConnectionFailed("refused".into()));
        assert!(down.is_storage_unavailable());

        let writer = Error::Database(DatabaseError::WriterUnavailable("closed".into()));
        assert!(writer.is_storage_unavailable());

        let query = Error::Database(DatabaseError::QueryFailed("syntax".into()));
        assert!(!query.is_storage_unavailable());
    }

    #[test]
    fn test_provider_unreachable_classification() {
        let open = Error::MarketData(MarketDataError::CircuitOpen {
            provider: "BRAPI".into(),
        });
        assert!(open.is_provider_unreachable());

        let missing = Error::MarketData(MarketDataError::SymbolNotFound("X".into()));
        assert!(!missing.is_provider_unreachable());
    }

    #[test]
    fn test_run_in_progress_display() {
        let err = Error::RunInProgress {
            run_id: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "An ingestion run is already in progress (run abc)"
        );
    }
}
