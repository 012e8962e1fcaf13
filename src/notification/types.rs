use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Categories a user can opt in or out of individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    WeatherWarnings,
    TripReminders,
    BudgetAlerts,
    JournalPrompts,
    SupportReplies,
    TicketUpdates,
    DailyTips,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 7] = [
        NotificationCategory::WeatherWarnings,
        NotificationCategory::TripReminders,
        NotificationCategory::BudgetAlerts,
        NotificationCategory::JournalPrompts,
        NotificationCategory::SupportReplies,
        NotificationCategory::TicketUpdates,
        NotificationCategory::DailyTips,
    ];

    /// Canonical wire name, matching the preference flag
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::WeatherWarnings => "weather_warnings",
            NotificationCategory::TripReminders => "trip_reminders",
            NotificationCategory::BudgetAlerts => "budget_alerts",
            NotificationCategory::JournalPrompts => "journal_prompts",
            NotificationCategory::SupportReplies => "support_replies",
            NotificationCategory::TicketUpdates => "ticket_updates",
            NotificationCategory::DailyTips => "daily_tips",
        }
    }

    /// Parse a category tag. The singular event names the mobile app sends
    /// (`weather_warning`, `trip_status`, ...) map onto the category that
    /// governs them. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let category = match tag.trim().to_ascii_lowercase().as_str() {
            "weather_warnings" | "weather_warning" => NotificationCategory::WeatherWarnings,
            "trip_reminders" | "trip_reminder" | "trip_status" => {
                NotificationCategory::TripReminders
            }
            "budget_alerts" | "budget_alert" | "expense_reminder" => {
                NotificationCategory::BudgetAlerts
            }
            "journal_prompts" | "journal_prompt" | "journal_ready" => {
                NotificationCategory::JournalPrompts
            }
            "support_replies" | "support_reply" => NotificationCategory::SupportReplies,
            "ticket_updates" | "ticket_update" => NotificationCategory::TicketUpdates,
            "daily_tips" | "daily_tip" => NotificationCategory::DailyTips,
            _ => return None,
        };
        Some(category)
    }

    /// Bounded metric label for an arbitrary tag
    pub fn metric_label(tag: &str) -> &'static str {
        Self::parse(tag).map(|c| c.as_str()).unwrap_or("unknown")
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery urgency hint passed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    #[default]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// A rendered notification, ready to fan out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    /// Category tag; may be unrecognised, in which case nobody is eligible
    pub category: String,
    pub priority: Priority,
    /// Free-form string payload delivered alongside the notification
    pub data: BTreeMap<String, String>,
}

impl NotificationMessage {
    pub fn builder(category: impl Into<String>) -> NotificationMessageBuilder {
        NotificationMessageBuilder::new(category)
    }
}

/// Builder for [`NotificationMessage`]
#[derive(Debug, Clone)]
pub struct NotificationMessageBuilder {
    title: String,
    body: String,
    category: String,
    priority: Priority,
    data: BTreeMap<String, String>,
}

impl NotificationMessageBuilder {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            category: category.into(),
            priority: Priority::default(),
            data: BTreeMap::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn extend_data<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> NotificationMessage {
        NotificationMessage {
            title: self.title,
            body: self.body,
            category: self.category,
            priority: self.priority,
            data: self.data,
        }
    }
}
