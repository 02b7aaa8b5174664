use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use simfolio_core::assets::{Asset, AssetUpdate, NewAsset};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Registers an asset. An already registered ticker answers 200 with the
/// stored record instead of 201.
async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewAsset>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let upsert = state.asset_service.upsert_asset(payload).await?;
    let status = if upsert.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upsert.asset)))
}

async fn list_assets(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Asset>>> {
    let assets = state.asset_service.get_assets()?;
    Ok(Json(assets))
}

async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<Asset>> {
    let asset = state
        .asset_service
        .find_by_ticker(&ticker)?
        .ok_or_else(|| ApiError::NotFound(format!("Asset {} not found", ticker)))?;
    Ok(Json(asset))
}

async fn update_asset(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Json(payload): Json<AssetUpdate>,
) -> ApiResult<Json<Asset>> {
    let asset = state.asset_service.update_asset(&ticker, payload).await?;
    Ok(Json(asset))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/{ticker}", get(get_asset).put(update_asset))
}
