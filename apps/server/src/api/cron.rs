use std::sync::Arc;

use axum::{extract::State, http::StatusCode, middleware, routing::get, Json, Router};
use simfolio_core::scheduler::RunRequest;

use crate::{
    api::shared::{run_response, RunEnvelope},
    auth::require_cron_secret,
    error::ApiResult,
    main_lib::AppState,
};

/// Daily price update for every active asset.
async fn update_prices(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<RunEnvelope>)> {
    let run = state.scheduler.force_update(RunRequest::cron()).await?;
    Ok(run_response(run))
}

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/cron/update-prices", get(update_prices).post(update_prices))
        .route_layer(middleware::from_fn_with_state(state, require_cron_secret))
}
