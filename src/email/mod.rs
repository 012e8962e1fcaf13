//! Support-ticket email notifications.
//!
//! Rendering lives in `templates`, delivery behind the `EmailSender` trait
//! (`ResendSender` in production).

mod resend;
mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notification::NotificationCategory;

pub use resend::ResendSender;
pub use templates::{render, status_label, substitute, FALLBACK_SUBJECT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    SupportReply,
    TicketCreated,
    TicketStatusChanged,
    TicketResolved,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::SupportReply => "support_reply",
            EmailKind::TicketCreated => "ticket_created",
            EmailKind::TicketStatusChanged => "ticket_status_changed",
            EmailKind::TicketResolved => "ticket_resolved",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "support_reply" => Some(EmailKind::SupportReply),
            "ticket_created" => Some(EmailKind::TicketCreated),
            "ticket_status_changed" => Some(EmailKind::TicketStatusChanged),
            "ticket_resolved" => Some(EmailKind::TicketResolved),
            _ => None,
        }
    }

    /// Preference category gating this email. Ticket receipts only need the
    /// email channel.
    pub fn category(&self) -> Option<NotificationCategory> {
        match self {
            EmailKind::SupportReply => Some(NotificationCategory::SupportReplies),
            EmailKind::TicketStatusChanged | EmailKind::TicketResolved => {
                Some(NotificationCategory::TicketUpdates)
            }
            EmailKind::TicketCreated => None,
        }
    }
}

/// Rendered email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email delivery is not configured")]
    NotConfigured,

    #[error("email provider rejected message with status {status}")]
    Rejected { status: u16 },

    #[error("email transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError>;
}

/// Sender used when no provider key is configured; every send fails.
#[derive(Debug, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, _to: &str, _content: &EmailContent) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}
