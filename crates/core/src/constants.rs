/// Default display precision for a newly registered asset
pub const DEFAULT_ASSET_DECIMALS: i32 = 2;

/// Upper bound accepted for an asset's display precision
pub const MAX_ASSET_DECIMALS: i32 = 10;

/// Shortest query the search service answers
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 2;

/// Maximum number of search results
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// History depth of a backfill "from inception"
pub const DEFAULT_BACKFILL_YEARS: u32 = 20;

/// Tickers processed concurrently within one ingestion run
pub const DEFAULT_WORKER_CONCURRENCY: usize = 4;
