//! Notification types, eligibility, composition and fan-out.
//!
//! # Delivery pipeline
//!
//! - `composer`: turns weather alert candidates into one rendered message
//! - `preferences`: decides per recipient whether a category may be delivered
//! - `dispatcher`: fans a message out over a `PushProvider` with one bearer
//!   token per batch
//!
//! `FcmProvider` is the production provider; tests plug in their own.

mod composer;
mod dispatcher;
mod fcm;
mod preferences;
mod provider;
mod routing;
mod severity;
mod types;

pub use composer::{compose, AlertCandidate, AlertContext, ComposeError, DESCRIPTION_PREVIEW_CHARS};
pub use dispatcher::{
    BatchResult, BatchSummary, DeliveryOutcome, DispatcherConfig, DispatcherStats,
    DispatcherStatsSnapshot, FailureReason, FanoutDispatcher, RecipientOutcome,
    DEFAULT_DELIVERY_TIMEOUT, DEFAULT_MAX_CONCURRENT_DELIVERIES,
};
pub use fcm::FcmProvider;
pub use preferences::{
    check_channel, check_push, is_eligible, Channel, PreferenceFlags, Recipient, SuppressionReason,
};
pub use provider::{DeliveryError, PushProvider};
pub use routing::{channel_for, DEFAULT_CHANNEL};
pub use severity::{classify, SeverityTier, HIGH_KEYWORDS, MEDIUM_KEYWORDS};
pub use types::{NotificationCategory, NotificationMessage, NotificationMessageBuilder, Priority};
