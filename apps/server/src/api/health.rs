use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use simfolio_core::scheduler::SchedulerStatus;

use crate::main_lib::AppState;

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
