//! Daily tip trigger

use std::slice;

use axum::{extract::State, Json};

use crate::error::{AppError, Result};
use crate::notification::{DeliveryOutcome, NotificationCategory, NotificationMessage};
use crate::server::AppState;
use crate::store::load_recipients;

use super::models::{DailyTipRequest, DailyTipResponse};

fn outcome_reason(outcome: Option<&DeliveryOutcome>) -> Option<String> {
    match outcome? {
        DeliveryOutcome::Sent => None,
        DeliveryOutcome::Suppressed(reason) => Some(reason.as_str().to_string()),
        DeliveryOutcome::Failed(_) => Some("delivery_failed".to_string()),
    }
}

/// Generate a tip for the user and push it.
///
/// The tip is returned even when it was suppressed or the delivery call
/// failed; `reason` says why. No bearer token means 502.
#[tracing::instrument(name = "http.daily_tip", skip(state, request))]
pub async fn daily_tip(
    State(state): State<AppState>,
    Json(request): Json<DailyTipRequest>,
) -> Result<Json<DailyTipResponse>> {
    let user_id = request
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?
        .to_string();

    let dispatcher = state.push_dispatcher()?;
    let tip = state.tips.generate(&request.upcoming_trips).await;

    let message = NotificationMessage::builder(NotificationCategory::DailyTips.as_str())
        .title(tip.title.clone())
        .body(tip.body.clone())
        .build();

    let recipients = load_recipients(state.store.as_ref(), slice::from_ref(&user_id)).await;
    let result = dispatcher.dispatch(&message, &recipients).await;
    if let Some(e) = result.credential_error {
        return Err(AppError::Credential(e));
    }
    let outcome = result.outcome_for(&user_id);

    Ok(Json(DailyTipResponse {
        success: true,
        sent: matches!(outcome, Some(DeliveryOutcome::Sent)),
        reason: outcome_reason(outcome),
        tip,
    }))
}
