//! Firebase Cloud Messaging HTTP v1 provider.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::credentials::BearerToken;

use super::provider::{DeliveryError, PushProvider};
use super::NotificationMessage;

const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
const DEFAULT_SOUND: &str = "default";

#[derive(Debug, Serialize)]
pub(crate) struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    data: BTreeMap<&'a str, &'a str>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AndroidConfig<'a> {
    priority: &'static str,
    notification: AndroidNotification<'a>,
}

#[derive(Debug, Serialize)]
struct AndroidNotification<'a> {
    channel_id: &'a str,
    sound: &'static str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig {
    payload: ApnsPayload,
}

#[derive(Debug, Serialize)]
struct ApnsPayload {
    aps: Aps,
}

#[derive(Debug, Serialize)]
struct Aps {
    sound: &'static str,
    badge: u32,
}

impl<'a> FcmRequest<'a> {
    pub(crate) fn new(device_token: &'a str, message: &'a NotificationMessage, channel_id: &'a str) -> Self {
        let mut data: BTreeMap<&str, &str> = message
            .data
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        data.insert("type", message.category.as_str());
        data.insert("click_action", CLICK_ACTION);

        Self {
            message: FcmMessage {
                token: device_token,
                notification: FcmNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data,
                android: AndroidConfig {
                    priority: message.priority.as_str(),
                    notification: AndroidNotification {
                        channel_id,
                        sound: DEFAULT_SOUND,
                    },
                },
                apns: ApnsConfig {
                    payload: ApnsPayload {
                        aps: Aps {
                            sound: DEFAULT_SOUND,
                            badge: 1,
                        },
                    },
                },
            },
        }
    }
}

pub struct FcmProvider {
    client: reqwest::Client,
    send_url: String,
}

impl FcmProvider {
    /// `base_url` is normally `https://fcm.googleapis.com`.
    pub fn new(base_url: &str, project_id: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, project_id))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, project_id: &str) -> Self {
        Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                base_url.trim_end_matches('/'),
                project_id
            ),
        }
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn deliver(
        &self,
        token: &BearerToken,
        device_token: &str,
        message: &NotificationMessage,
        channel_id: &str,
    ) -> Result<(), DeliveryError> {
        let request = FcmRequest::new(device_token, message, channel_id);

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token.secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %detail, "FCM rejected message");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
