//! Category tag to Android notification channel.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Channel for any tag not in the table
pub const DEFAULT_CHANNEL: &str = "waylo_general";

lazy_static! {
    static ref CHANNEL_ROUTES: HashMap<&'static str, &'static str> = {
        let mut routes = HashMap::new();
        for tag in [
            "trip_reminder",
            "trip_reminders",
            "trip_status",
            "weather_warning",
            "weather_warnings",
        ] {
            routes.insert(tag, "waylo_trips");
        }
        for tag in ["expense_reminder", "budget_alert", "budget_alerts"] {
            routes.insert(tag, "waylo_expenses");
        }
        for tag in ["journal_ready", "journal_prompt", "journal_prompts"] {
            routes.insert(tag, "waylo_journal");
        }
        for tag in ["support_reply", "support_replies", "ticket_update", "ticket_updates"] {
            routes.insert(tag, "waylo_support");
        }
        routes
    };
}

/// Channel for a category tag. Never fails; unmapped tags get the default.
pub fn channel_for(category: &str) -> &'static str {
    CHANNEL_ROUTES
        .get(category)
        .copied()
        .unwrap_or(DEFAULT_CHANNEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_routes() {
        assert_eq!(channel_for("weather_warnings"), "waylo_trips");
        assert_eq!(channel_for("trip_status"), "waylo_trips");
        assert_eq!(channel_for("budget_alerts"), "waylo_expenses");
        assert_eq!(channel_for("journal_ready"), "waylo_journal");
        assert_eq!(channel_for("ticket_update"), "waylo_support");
    }

    #[test]
    fn test_unknown_routes_to_default() {
        assert_eq!(channel_for("daily_tips"), DEFAULT_CHANNEL);
        assert_eq!(channel_for(""), DEFAULT_CHANNEL);
        assert_eq!(channel_for("something_new"), DEFAULT_CHANNEL);
    }
}
