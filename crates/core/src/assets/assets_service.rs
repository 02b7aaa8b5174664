use log::{debug, info};
use std::sync::Arc;

use super::assets_model::{normalize_ticker, Asset, AssetUpdate, AssetUpsert, NewAsset};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::errors::{DatabaseError, Error, Result, ValidationError};

/// Service for managing assets
pub struct AssetService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
}

impl AssetService {
    pub fn new(asset_repository: Arc<dyn AssetRepositoryTrait>) -> Self {
        Self { asset_repository }
    }
}

#[async_trait::async_trait]
impl AssetServiceTrait for AssetService {
    async fn upsert_asset(&self, new_asset: NewAsset) -> Result<AssetUpsert> {
        new_asset.validate()?;
        let normalized = new_asset.normalized();

        let (asset, created) = self.asset_repository.create_if_absent(normalized).await?;
        if created {
            info!("Registered asset {} ({})", asset.ticker, asset.market);
        } else {
            debug!("Asset {} already registered, returning existing", asset.ticker);
        }
        Ok(AssetUpsert { asset, created })
    }

    fn find_by_ticker(&self, ticker: &str) -> Result<Option<Asset>> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Ok(None);
        }
        match self.asset_repository.get_by_ticker(&ticker) {
            Ok(asset) => Ok(Some(asset)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_assets(&self) -> Result<Vec<Asset>> {
        self.asset_repository.list()
    }

    fn list_active(&self) -> Result<Vec<Asset>> {
        self.asset_repository.list_active()
    }

    fn search_by_text(&self, query: &str, limit: usize) -> Result<Vec<Asset>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        self.asset_repository.search_by_text(query, limit)
    }

    async fn update_asset(&self, ticker: &str, update: AssetUpdate) -> Result<Asset> {
        update.validate()?;
        if update.is_empty() {
            return Err(ValidationError::InvalidInput("No fields to update".to_string()).into());
        }
        let ticker = normalize_ticker(ticker);
        if self.find_by_ticker(&ticker)?.is_none() {
            return Err(Error::NotFound(format!("Asset {}", ticker)));
        }
        let asset = self
            .asset_repository
            .update(&ticker, update.normalized())
            .await?;
        info!("Updated metadata for asset {}", asset.ticker);
        Ok(asset)
    }
}
