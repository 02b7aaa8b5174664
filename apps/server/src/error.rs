use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use simfolio_core::errors::{DatabaseError, Error as CoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub code: u16,
    pub kind: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub(crate) fn response(status: StatusCode, kind: &'static str, message: String) -> Response {
        let body = Json(ErrorBody {
            code: status.as_u16(),
            kind,
            message,
        });
        (status, body).into_response()
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn classify(e: &CoreError) -> (StatusCode, &'static str, String) {
    match e {
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
        CoreError::NotFound(_) | CoreError::Database(DatabaseError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
        }
        CoreError::RunInProgress { .. } => (StatusCode::CONFLICT, "RUN_IN_PROGRESS", e.to_string()),
        _ if e.is_storage_unavailable() => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_UNAVAILABLE",
            "Storage unavailable".to_string(),
        ),
        CoreError::MarketData(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", e.to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            INTERNAL_MESSAGE.to_string(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Core(e) => classify(e),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                INTERNAL_MESSAGE.to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        ErrorBody::response(status, kind, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
