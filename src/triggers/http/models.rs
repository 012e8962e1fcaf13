//! HTTP request/response models for notification triggers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::{AlertCandidate, Priority, RecipientOutcome};
use crate::sources::{Tip, TripInfo};

/// Request to push a notification to one or more users.
///
/// Content is either direct (`title` + `body`) or composed from weather
/// `alerts` plus trip context.
#[derive(Debug, Default, Deserialize)]
pub struct SendPushRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    /// Category tag; `type` is accepted for mobile-app compatibility
    #[serde(default, alias = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Extra payload; non-string values are sent as their JSON text
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub alerts: Option<Vec<AlertCandidate>>,
    #[serde(default)]
    pub trip_title: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
}

impl SendPushRequest {
    /// `user_id` followed by `user_ids`, blanks dropped, duplicates removed
    /// keeping the first occurrence.
    pub fn recipient_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.user_ids.len() + 1);
        for id in self.user_id.iter().chain(self.user_ids.iter()) {
            let id = id.trim();
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// Error detail embedded in a push response
#[derive(Debug, Serialize)]
pub struct PushErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Response for push send operations
#[derive(Debug, Serialize)]
pub struct SendPushResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub sent: usize,
    pub failed: usize,
    pub suppressed: usize,
    /// Number of distinct recipients requested
    pub total: usize,
    pub results: Vec<RecipientOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PushErrorBody>,
}

/// Response for the weather sweep
#[derive(Debug, Serialize)]
pub struct WeatherCheckResponse {
    pub success: bool,
    /// Trips whose owner was eligible and whose weather was fetched
    pub checked: usize,
    pub alerts_sent: usize,
    pub total_trips: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyTipRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub upcoming_trips: Vec<TripInfo>,
}

#[derive(Debug, Serialize)]
pub struct DailyTipResponse {
    pub success: bool,
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub tip: Tip,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportEmailRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SupportEmailResponse {
    pub success: bool,
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
