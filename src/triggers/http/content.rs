//! Push content resolution (direct or composed from alerts)

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::notification::{compose, AlertCandidate, AlertContext, NotificationMessage, Priority};

use super::models::SendPushRequest;

/// Content of a push request
#[derive(Debug)]
pub enum PushContent {
    /// Caller-rendered title and body
    Direct {
        title: String,
        body: String,
        data: BTreeMap<String, String>,
    },
    /// Weather alerts to be composed into one message
    Alerts {
        alerts: Vec<AlertCandidate>,
        context: AlertContext,
        data: BTreeMap<String, String>,
    },
}

fn stringify(data: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

impl PushContent {
    /// Alerts win when present; otherwise both title and body are required.
    pub fn from_request(request: &SendPushRequest) -> Result<Self> {
        let data = stringify(&request.data);

        if let Some(alerts) = request.alerts.as_ref().filter(|a| !a.is_empty()) {
            return Ok(PushContent::Alerts {
                alerts: alerts.clone(),
                context: AlertContext {
                    trip_title: request.trip_title.clone().unwrap_or_default(),
                    destination: request.destination.clone().unwrap_or_default(),
                    entity_id: request.trip_id.clone(),
                },
                data,
            });
        }

        let title = request.title.as_deref().map(str::trim).unwrap_or_default();
        let body = request.body.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() || body.is_empty() {
            return Err(AppError::Validation(
                "title and body (or alerts) are required".to_string(),
            ));
        }

        Ok(PushContent::Direct {
            title: title.to_string(),
            body: body.to_string(),
            data,
        })
    }

    /// Render into a message of `category`. An explicit priority overrides
    /// the default (High, or the tier's priority for alerts).
    pub fn resolve(self, category: &str, priority: Option<Priority>) -> Result<NotificationMessage> {
        match self {
            PushContent::Direct { title, body, data } => Ok(NotificationMessage::builder(category)
                .title(title)
                .body(body)
                .priority(priority.unwrap_or_default())
                .extend_data(data)
                .build()),
            PushContent::Alerts {
                alerts,
                context,
                data,
            } => {
                let mut message =
                    compose(&alerts, &context).map_err(|e| AppError::Validation(e.to_string()))?;
                message.category = category.to_string();
                if let Some(priority) = priority {
                    message.priority = priority;
                }
                // Composed keys win over caller-supplied ones
                for (key, value) in data {
                    message.data.entry(key).or_insert(value);
                }
                Ok(message)
            }
        }
    }
}
