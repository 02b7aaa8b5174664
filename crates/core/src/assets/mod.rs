//! Assets module - the registry of tradable instruments.

mod assets_model;
mod assets_service;
mod assets_traits;


pub use assets_model::{normalize_ticker, Asset, AssetUpdate, AssetUpsert, NewAsset};
pub use assets_service::AssetService;
pub use assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
