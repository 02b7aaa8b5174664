use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use simfolio_core::{constants::DEFAULT_MIN_QUERY_LENGTH, search::SearchResultItem};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    #[serde(default)]
    query: String,
    simulation_date: Option<NaiveDate>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchResultItem>>> {
    let results =
        state
            .search_service
            .search(&q.query, DEFAULT_MIN_QUERY_LENGTH, q.simulation_date)?;
    Ok(Json(results))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/search", get(search))
}
