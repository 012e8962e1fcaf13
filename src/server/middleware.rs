use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::AppError;
use crate::metrics::HttpMetrics;

/// API key authentication for the trigger endpoints.
///
/// Accepts the key in `X-API-Key` or as `Authorization: Bearer <key>`.
/// With no `api.key` configured every request passes (development mode).
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected_key) = state.settings.api.key.as_deref().filter(|k| !k.is_empty()) else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| extract_bearer_token(&req));

    match provided {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(AppError::Auth("Invalid API key".to_string()))
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(AppError::Auth("Missing API key".to_string()))
        }
    }
}

/// Count every routed response by route template and status, including the
/// rejections produced by extractors and the auth layer.
pub async fn track_http_metrics(req: Request<Body>, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    HttpMetrics::record_request(&endpoint, response.status().as_u16());
    response
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
