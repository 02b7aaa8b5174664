use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use simfolio_core::{
    quotes::HistoricalPrice,
    scheduler::{RunRequest, SchedulerStatus, TickerSelection},
};

use crate::{
    api::shared::{run_response, RunEnvelope},
    auth::require_cron_secret,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum SyncMode {
    #[default]
    Backfill,
    Incremental,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest {
    tickers: Option<Vec<String>>,
    all: Option<bool>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    #[serde(default)]
    mode: SyncMode,
}

impl SyncRequest {
    fn into_run_request(self) -> Result<RunRequest, ApiError> {
        let tickers: Vec<String> = self
            .tickers
            .unwrap_or_default()
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();

        let selection = if !tickers.is_empty() {
            TickerSelection::Only(tickers)
        } else if self.all.unwrap_or(false) {
            TickerSelection::All
        } else {
            return Err(ApiError::BadRequest(
                "Provide a non-empty 'tickers' list or 'all': true".to_string(),
            ));
        };

        if let Some(from) = self.from {
            let to = self.to.unwrap_or_else(|| Utc::now().date_naive());
            if from > to {
                return Err(ApiError::BadRequest(format!(
                    "'from' ({from}) is after 'to' ({to})"
                )));
            }
        }

        Ok(match self.mode {
            SyncMode::Incremental => RunRequest::forced(selection),
            SyncMode::Backfill => RunRequest::backfill(selection, self.from, self.to),
        })
    }
}

/// Forced or backfill run for selected tickers.
async fn sync_market_data(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SyncRequest>,
) -> ApiResult<(StatusCode, Json<RunEnvelope>)> {
    let request = body.into_run_request()?;
    let run = state.scheduler.force_update(request).await?;
    Ok(run_response(run))
}

async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

#[derive(Deserialize)]
struct PriceQuery {
    date: Option<NaiveDate>,
}

async fn get_price(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<PriceQuery>,
) -> ApiResult<Json<HistoricalPrice>> {
    let price = state
        .search_service
        .price_as_of(&ticker, q.date)?
        .ok_or_else(|| match q.date {
            Some(date) => ApiError::NotFound(format!("No price for {} on or before {}", ticker, date)),
            None => ApiError::NotFound(format!("No price for {}", ticker)),
        })?;
    Ok(Json(price))
}

#[derive(Deserialize)]
struct HistoryQuery {
    from: NaiveDate,
    to: NaiveDate,
}

async fn get_price_history(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<HistoricalPrice>>> {
    let prices = state.search_service.price_history(&ticker, q.from, q.to)?;
    Ok(Json(prices))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-data/sync/status", get(sync_status))
        .route("/market-data/prices/{ticker}", get(get_price))
        .route("/market-data/prices/{ticker}/history", get(get_price_history))
}

/// The manual sync trigger. Kept apart from [`router`] so it runs outside the
/// request timeout.
pub fn sync_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-data/sync", post(sync_market_data))
        .route_layer(middleware::from_fn_with_state(state, require_cron_secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simfolio_core::ingestion::{IngestionMode, RunTrigger};

    fn parse(body: &str) -> SyncRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_defaults_to_backfill_for_listed_tickers() {
        let request = parse(r#"{"tickers":["petr4"],"from":"2024-01-01","to":"2024-01-31"}"#)
            .into_run_request()
            .unwrap();
        assert_eq!(request.trigger, RunTrigger::Forced);
        assert_eq!(
            request.mode,
            IngestionMode::FullBackfill {
                from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }
        );
    }

    #[test]
    fn test_all_with_backfill_is_bulk() {
        let request = parse(r#"{"all":true}"#).into_run_request().unwrap();
        assert_eq!(request.trigger, RunTrigger::BulkBackfill);
        assert_eq!(request.tickers, TickerSelection::All);
    }

    #[test]
    fn test_incremental_mode() {
        let request = parse(r#"{"tickers":["VALE3"],"mode":"incremental"}"#)
            .into_run_request()
            .unwrap();
        assert_eq!(request.mode, IngestionMode::Incremental);
    }

    #[test]
    fn test_requires_a_selection() {
        assert!(parse("{}").into_run_request().is_err());
        assert!(parse(r#"{"tickers":[" "]}"#).into_run_request().is_err());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = parse(r#"{"all":true,"from":"2024-02-01","to":"2024-01-01"}"#)
            .into_run_request()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
