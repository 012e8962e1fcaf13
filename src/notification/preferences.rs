//! Per-recipient delivery eligibility. Everything here fails closed: a missing
//! settings row or an unknown category means "do not deliver".

use serde::{Deserialize, Serialize};

use super::NotificationCategory;

/// Stored notification settings of one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceFlags {
    pub master_enabled: bool,
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub weather_warnings: bool,
    pub trip_reminders: bool,
    pub budget_alerts: bool,
    pub journal_prompts: bool,
    pub support_replies: bool,
    pub ticket_updates: bool,
    pub daily_tips: bool,
}

impl PreferenceFlags {
    /// Every switch on
    pub fn all_enabled() -> Self {
        Self {
            master_enabled: true,
            push_enabled: true,
            email_enabled: true,
            weather_warnings: true,
            trip_reminders: true,
            budget_alerts: true,
            journal_prompts: true,
            support_replies: true,
            ticket_updates: true,
            daily_tips: true,
        }
    }

    pub fn allows(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::WeatherWarnings => self.weather_warnings,
            NotificationCategory::TripReminders => self.trip_reminders,
            NotificationCategory::BudgetAlerts => self.budget_alerts,
            NotificationCategory::JournalPrompts => self.journal_prompts,
            NotificationCategory::SupportReplies => self.support_replies,
            NotificationCategory::TicketUpdates => self.ticket_updates,
            NotificationCategory::DailyTips => self.daily_tips,
        }
    }

    pub fn set(&mut self, category: NotificationCategory, enabled: bool) {
        let flag = match category {
            NotificationCategory::WeatherWarnings => &mut self.weather_warnings,
            NotificationCategory::TripReminders => &mut self.trip_reminders,
            NotificationCategory::BudgetAlerts => &mut self.budget_alerts,
            NotificationCategory::JournalPrompts => &mut self.journal_prompts,
            NotificationCategory::SupportReplies => &mut self.support_replies,
            NotificationCategory::TicketUpdates => &mut self.ticket_updates,
            NotificationCategory::DailyTips => &mut self.daily_tips,
        };
        *flag = enabled;
    }

    pub fn with(mut self, category: NotificationCategory, enabled: bool) -> Self {
        self.set(category, enabled);
        self
    }
}

/// A delivery target as read from the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: String,
    /// Provider device token; `None` when the user never registered a device
    pub device_token: Option<String>,
    /// `None` when the user has no settings row
    pub preferences: Option<PreferenceFlags>,
}

impl Recipient {
    pub fn new(
        user_id: impl Into<String>,
        device_token: Option<String>,
        preferences: Option<PreferenceFlags>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_token,
            preferences,
        }
    }

    /// Recipient whose preferences could not be read
    pub fn unknown(user_id: impl Into<String>) -> Self {
        Self::new(user_id, None, None)
    }
}

/// Why a recipient was intentionally skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    NoPreferences,
    MasterDisabled,
    ChannelDisabled,
    CategoryDisabled,
    UnknownCategory,
    NoDeviceToken,
}

impl SuppressionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionReason::NoPreferences => "no_preferences",
            SuppressionReason::MasterDisabled => "master_disabled",
            SuppressionReason::ChannelDisabled => "channel_disabled",
            SuppressionReason::CategoryDisabled => "category_disabled",
            SuppressionReason::UnknownCategory => "unknown_category",
            SuppressionReason::NoDeviceToken => "no_device_token",
        }
    }
}

/// Delivery channel a preference check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Push,
    Email,
}

/// Check whether `category` may be delivered on `channel`.
///
/// `category = None` means the message only needs the channel switch
/// (e.g. a ticket-created receipt).
pub fn check_channel(
    preferences: Option<&PreferenceFlags>,
    channel: Channel,
    category: Option<NotificationCategory>,
) -> Result<(), SuppressionReason> {
    let flags = preferences.ok_or(SuppressionReason::NoPreferences)?;

    if !flags.master_enabled {
        return Err(SuppressionReason::MasterDisabled);
    }

    let channel_enabled = match channel {
        Channel::Push => flags.push_enabled,
        Channel::Email => flags.email_enabled,
    };
    if !channel_enabled {
        return Err(SuppressionReason::ChannelDisabled);
    }

    match category {
        Some(category) if !flags.allows(category) => Err(SuppressionReason::CategoryDisabled),
        _ => Ok(()),
    }
}

/// Push eligibility for a category tag, with the reason when not eligible.
pub fn check_push(recipient: &Recipient, category: &str) -> Result<(), SuppressionReason> {
    let parsed = NotificationCategory::parse(category);
    check_channel(recipient.preferences.as_ref(), Channel::Push, parsed)?;
    // Checked after the flags so an opted-out user is reported as such
    if parsed.is_none() {
        return Err(SuppressionReason::UnknownCategory);
    }
    Ok(())
}

/// True iff master, push channel and the category flag are all enabled.
pub fn is_eligible(recipient: &Recipient, category: &str) -> bool {
    check_push(recipient, category).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(flags: Option<PreferenceFlags>) -> Recipient {
        Recipient::new("user-1", Some("device-1".to_string()), flags)
    }

    #[test]
    fn test_all_enabled_is_eligible() {
        let r = recipient(Some(PreferenceFlags::all_enabled()));
        for category in NotificationCategory::ALL {
            assert!(is_eligible(&r, category.as_str()));
        }
    }

    #[test]
    fn test_master_switch() {
        let flags = PreferenceFlags {
            master_enabled: false,
            ..PreferenceFlags::all_enabled()
        };
        let r = recipient(Some(flags));
        assert!(!is_eligible(&r, "weather_warnings"));
        assert_eq!(check_push(&r, "weather_warnings"), Err(SuppressionReason::MasterDisabled));
    }

    #[test]
    fn test_push_channel_switch() {
        let flags = PreferenceFlags {
            push_enabled: false,
            ..PreferenceFlags::all_enabled()
        };
        assert_eq!(
            check_push(&recipient(Some(flags)), "daily_tips"),
            Err(SuppressionReason::ChannelDisabled)
        );
    }

    #[test]
    fn test_category_switch() {
        let flags = PreferenceFlags::all_enabled().with(NotificationCategory::WeatherWarnings, false);
        let r = recipient(Some(flags));
        assert_eq!(
            check_push(&r, "weather_warnings"),
            Err(SuppressionReason::CategoryDisabled)
        );
        assert!(is_eligible(&r, "trip_reminders"));
    }

    #[test]
    fn test_fail_closed() {
        assert_eq!(
            check_push(&recipient(None), "weather_warnings"),
            Err(SuppressionReason::NoPreferences)
        );
        assert_eq!(
            check_push(&recipient(Some(PreferenceFlags::all_enabled())), "marketing"),
            Err(SuppressionReason::UnknownCategory)
        );
    }

    #[test]
    fn test_email_channel_without_category() {
        let flags = PreferenceFlags {
            push_enabled: false,
            support_replies: false,
            ..PreferenceFlags::all_enabled()
        };
        assert_eq!(check_channel(Some(&flags), Channel::Email, None), Ok(()));
        assert_eq!(
            check_channel(Some(&flags), Channel::Email, Some(NotificationCategory::SupportReplies)),
            Err(SuppressionReason::CategoryDisabled)
        );
    }
}
