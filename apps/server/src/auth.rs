//! Shared-secret guard for the cron and forced-sync endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::error::ErrorBody;
use crate::main_lib::AppState;

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    /// No secret is configured; every call is rejected.
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing bearer token",
            AuthError::InvalidToken => "Invalid bearer token",
            AuthError::NotConfigured => "Cron secret is not configured for this server",
        };
        ErrorBody::response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.to_string())
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(AuthError::MissingToken);
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Compares SHA-256 digests so the comparison time does not depend on where
/// the candidate first differs from the secret.
fn secrets_match(candidate: &str, secret: &str) -> bool {
    let a = Sha256::digest(candidate.as_bytes());
    let b = Sha256::digest(secret.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn verify_bearer(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AuthError> {
    let token = bearer_token(headers)?;
    let secret = secret.ok_or(AuthError::NotConfigured)?;
    if secrets_match(token, secret) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(e) = verify_bearer(request.headers(), state.cron_secret.as_deref()) {
        tracing::warn!(path = %request.uri().path(), reason = ?e, "rejected cron request");
        return Err(e);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_accepts_matching_secret() {
        assert_eq!(verify_bearer(&headers("Bearer s3cret"), Some("s3cret")), Ok(()));
        assert_eq!(verify_bearer(&headers("bearer s3cret"), Some("s3cret")), Ok(()));
    }

    #[test]
    fn test_rejects_wrong_or_missing_token() {
        assert_eq!(
            verify_bearer(&headers("Bearer nope"), Some("s3cret")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            verify_bearer(&HeaderMap::new(), Some("s3cret")),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            verify_bearer(&headers("Basic s3cret"), Some("s3cret")),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            verify_bearer(&headers("Bearer "), Some("s3cret")),
            Err(AuthError::MissingToken)
        );
    }

    #[test]
    fn test_unconfigured_secret_rejects_everything() {
        assert_eq!(
            verify_bearer(&headers("Bearer anything"), None),
            Err(AuthError::NotConfigured)
        );
    }
}
