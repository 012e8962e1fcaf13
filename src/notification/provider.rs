use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::BearerToken;

use super::NotificationMessage;

/// Failure of a single recipient's delivery call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("provider rejected delivery with status {status}")]
    Rejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery timed out")]
    Timeout,
}

/// One outbound call per device.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn deliver(
        &self,
        token: &BearerToken,
        device_token: &str,
        message: &NotificationMessage,
        channel_id: &str,
    ) -> Result<(), DeliveryError>;
}
