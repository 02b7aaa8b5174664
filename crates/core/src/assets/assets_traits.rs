use super::assets_model::{Asset, AssetUpdate, AssetUpsert, NewAsset};
use crate::errors::Result;

/// Trait defining the contract for Asset service operations.
#[async_trait::async_trait]
pub trait AssetServiceTrait: Send + Sync {
    /// Registers an asset. Idempotent: an existing ticker returns the stored
    /// record unchanged, whatever metadata the second call carries.
    async fn upsert_asset(&self, new_asset: NewAsset) -> Result<AssetUpsert>;
    fn find_by_ticker(&self, ticker: &str) -> Result<Option<Asset>>;
    fn get_assets(&self) -> Result<Vec<Asset>>;
    fn list_active(&self) -> Result<Vec<Asset>>;
    /// Ticker-prefix matches first, then name-substring matches.
    fn search_by_text(&self, query: &str, limit: usize) -> Result<Vec<Asset>>;
    /// Explicit metadata correction. Ingestion never calls this.
    async fn update_asset(&self, ticker: &str, update: AssetUpdate) -> Result<Asset>;
}

/// Trait defining the contract for Asset repository operations.
#[async_trait::async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    /// Inserts `new_asset` unless its ticker exists. Returns the stored row and
    /// whether it was inserted. Check and insert happen in one write transaction.
    async fn create_if_absent(&self, new_asset: NewAsset) -> Result<(Asset, bool)>;
    async fn update(&self, ticker: &str, update: AssetUpdate) -> Result<Asset>;
    /// Fails with `DatabaseError::NotFound` for an unknown ticker.
    fn get_by_ticker(&self, ticker: &str) -> Result<Asset>;
    fn list(&self) -> Result<Vec<Asset>>;
    fn list_active(&self) -> Result<Vec<Asset>>;
    /// Case-insensitive search over active assets: ticker-prefix matches
    /// ordered by ticker, then name-substring matches ordered by name, at most
    /// `limit` rows without duplicates.
    fn search_by_text(&self, query: &str, limit: usize) -> Result<Vec<Asset>>;
}
