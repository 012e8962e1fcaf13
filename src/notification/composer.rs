//! Turns competing hazard alerts into one weather notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::severity::{classify, SeverityTier};
use super::{NotificationCategory, NotificationMessage};

/// Description prefix kept in the notification body
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

/// A hazard alert reported for a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub event: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Issuing agency
    #[serde(default)]
    pub source: String,
}

impl AlertCandidate {
    pub fn new(event: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            description: description.into(),
            starts_at: None,
            ends_at: None,
            source: String::new(),
        }
    }
}

/// Trip the alerts apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    pub trip_title: String,
    pub destination: String,
    /// Entity identifier echoed in the payload as `id`
    #[serde(default)]
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("no alert candidates to compose")]
    NoCandidates,
}

/// Pick the most severe candidate (first one wins among equals) and render
/// the tier's title/body.
pub fn compose(
    candidates: &[AlertCandidate],
    context: &AlertContext,
) -> Result<NotificationMessage, ComposeError> {
    let (primary, tier) = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| (index, candidate, classify(&candidate.event)))
        .min_by_key(|(index, _, tier)| (tier.rank(), *index))
        .map(|(_, candidate, tier)| (candidate, tier))
        .ok_or(ComposeError::NoCandidates)?;

    let preview = preview(&primary.description);
    let (title, body) = match tier {
        SeverityTier::High => (
            format!("\u{26a0}\u{fe0f} SEVERE: {}", primary.event),
            format!(
                "Critical weather alert for your trip \"{}\" to {}. {}",
                context.trip_title, context.destination, preview
            ),
        ),
        SeverityTier::Medium => (
            format!("\u{1f327}\u{fe0f} Weather Warning: {}", primary.event),
            format!("Weather alert for \"{}\": {}", context.trip_title, preview),
        ),
        SeverityTier::Low => (
            format!("Weather Advisory for {}", context.destination),
            format!("{}: {}", primary.event, preview),
        ),
    };

    let mut builder = NotificationMessage::builder(NotificationCategory::WeatherWarnings.as_str())
        .title(title)
        .body(body)
        .priority(tier.priority())
        .data("alert_count", candidates.len().to_string())
        .data("severity", tier.as_str());

    if let Some(ref id) = context.entity_id {
        builder = builder.data("id", id.clone());
    }

    Ok(builder.build())
}

fn preview(description: &str) -> String {
    let description = description.trim();
    let mut chars = description.char_indices();
    match chars.nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &description[..cut], ELLIPSIS),
        None => description.to_string(),
    }
}
