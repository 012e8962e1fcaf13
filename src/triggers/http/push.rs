//! Direct push trigger

use axum::{extract::State, http::StatusCode, Json};

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::store::load_recipients;

use super::content::PushContent;
use super::models::{PushErrorBody, SendPushRequest, SendPushResponse};

/// Push a notification to the requested users.
///
/// 400 on a malformed request, 500 when push signing is not configured,
/// 502 when no bearer token could be obtained (the body still carries the
/// per-recipient outcomes).
#[tracing::instrument(
    name = "http.send_push",
    skip(state, request),
    fields(category = tracing::field::Empty, recipient_count = tracing::field::Empty)
)]
pub async fn send_push(
    State(state): State<AppState>,
    Json(request): Json<SendPushRequest>,
) -> Result<(StatusCode, Json<SendPushResponse>)> {
    let user_ids = request.recipient_ids();
    if user_ids.is_empty() {
        return Err(AppError::Validation("user_id or user_ids is required".to_string()));
    }

    let category = request
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("category is required".to_string()))?
        .to_string();

    let span = tracing::Span::current();
    span.record("category", category.as_str());
    span.record("recipient_count", user_ids.len());

    let message = PushContent::from_request(&request)?.resolve(&category, request.priority)?;

    let dispatcher = state.push_dispatcher()?;
    let recipients = load_recipients(state.store.as_ref(), &user_ids).await;
    let result = dispatcher.dispatch(&message, &recipients).await;
    let summary = result.summary();

    let (status, error) = match &result.credential_error {
        Some(e) => (
            StatusCode::BAD_GATEWAY,
            Some(PushErrorBody {
                code: AppError::from(e.clone()).code(),
                message: e.to_string(),
            }),
        ),
        None => (StatusCode::OK, None),
    };

    Ok((
        status,
        Json(SendPushResponse {
            success: error.is_none(),
            batch_id: result.batch_id,
            sent: summary.sent,
            failed: summary.failed,
            suppressed: summary.suppressed,
            total: user_ids.len(),
            results: result.outcomes,
            error,
        }),
    ))
}
