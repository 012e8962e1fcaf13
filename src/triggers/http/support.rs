//! Support email trigger

use axum::{extract::State, Json};

use crate::email::{render, EmailKind, FALLBACK_SUBJECT};
use crate::error::{AppError, Result};
use crate::notification::{check_channel, Channel, SuppressionReason};
use crate::server::AppState;

use super::models::{SupportEmailRequest, SupportEmailResponse};

/// Reason reported when the preference gate blocks an email
fn suppression_reason(kind: EmailKind, reason: SuppressionReason) -> &'static str {
    match reason {
        SuppressionReason::MasterDisabled | SuppressionReason::ChannelDisabled => "email_disabled",
        SuppressionReason::CategoryDisabled => match kind {
            EmailKind::SupportReply => "support_reply_disabled",
            _ => "status_updates_disabled",
        },
        other => other.as_str(),
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

/// Send a support-ticket email if the user's preferences allow it.
#[tracing::instrument(name = "http.support_email", skip(state, request))]
pub async fn support_email(
    State(state): State<AppState>,
    Json(request): Json<SupportEmailRequest>,
) -> Result<Json<SupportEmailResponse>> {
    let user_id = required(&request.user_id, "user_id")?;
    let session_id = required(&request.session_id, "session_id")?;
    let kind_tag = required(&request.kind, "type")?;
    let kind = EmailKind::parse(kind_tag)
        .ok_or_else(|| AppError::Validation(format!("unknown email type: {}", kind_tag)))?;

    let contact = state
        .store
        .email_contact(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let address = contact
        .email
        .clone()
        .ok_or_else(|| AppError::NotFound("User email not found".to_string()))?;

    if let Err(reason) = check_channel(contact.preferences.as_ref(), Channel::Email, kind.category()) {
        let reason = suppression_reason(kind, reason);
        tracing::info!(user_id = %user_id, kind = kind.as_str(), reason = reason, "Support email suppressed");
        return Ok(Json(SupportEmailResponse {
            success: true,
            sent: false,
            reason: Some(reason.to_string()),
        }));
    }

    let subject = match request.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(subject) => subject.to_string(),
        None => match state.store.support_subject(session_id).await {
            Ok(Some(subject)) if !subject.trim().is_empty() => subject,
            Ok(_) => FALLBACK_SUBJECT.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session_id, "Support subject lookup failed");
                FALLBACK_SUBJECT.to_string()
            }
        },
    };

    let content = render(
        kind,
        contact.full_name.as_deref(),
        &subject,
        request.message.as_deref(),
        request.new_status.as_deref(),
    );

    let (sent, reason) = match state.email.send(&address, &content).await {
        Ok(()) => (true, None),
        Err(e) => {
            tracing::warn!(error = %e, kind = kind.as_str(), "Support email not sent");
            (false, Some("delivery_failed".to_string()))
        }
    };

    Ok(Json(SupportEmailResponse {
        success: true,
        sent,
        reason,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppression_reasons() {
        assert_eq!(
            suppression_reason(EmailKind::TicketCreated, SuppressionReason::ChannelDisabled),
            "email_disabled"
        );
        assert_eq!(
            suppression_reason(EmailKind::SupportReply, SuppressionReason::CategoryDisabled),
            "support_reply_disabled"
        );
        assert_eq!(
            suppression_reason(EmailKind::TicketResolved, SuppressionReason::CategoryDisabled),
            "status_updates_disabled"
        );
        assert_eq!(
            suppression_reason(EmailKind::TicketResolved, SuppressionReason::NoPreferences),
            "no_preferences"
        );
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(required(&Some(" s-1 ".to_string()), "session_id").unwrap(), "s-1");
        assert!(required(&None, "session_id").is_err());
        assert!(required(&Some("   ".to_string()), "session_id").is_err());
    }
}
