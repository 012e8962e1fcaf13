//! HTTP notification trigger handlers
//!
//! - Direct push to one or more users
//! - Scheduled weather sweep
//! - Daily tip
//! - Support-ticket email

mod content;
mod models;
mod push;
mod support;
mod tips;
mod weather;

pub use push::send_push;
pub use support::support_email;
pub use tips::daily_tip;
pub use weather::check_weather;

pub use content::PushContent;
pub use models::{
    DailyTipRequest, DailyTipResponse, PushErrorBody, SendPushRequest, SendPushResponse,
    SupportEmailRequest, SupportEmailResponse, WeatherCheckResponse,
};
