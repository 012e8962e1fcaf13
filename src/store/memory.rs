use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::notification::{PreferenceFlags, Recipient};

use super::{EmailContact, PreferenceLookupError, RecipientStore, Trip};

/// Profile row of the in-memory store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryProfile {
    pub device_token: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl MemoryProfile {
    pub fn with_device(device_token: impl Into<String>) -> Self {
        Self {
            device_token: Some(device_token.into()),
            ..Self::default()
        }
    }

    pub fn with_email(email: impl Into<String>, full_name: Option<&str>) -> Self {
        Self {
            email: Some(email.into()),
            full_name: full_name.map(str::to_string),
            ..Self::default()
        }
    }
}

/// In-memory store backed by DashMap.
#[derive(Debug, Default)]
pub struct MemoryRecipientStore {
    profiles: DashMap<String, MemoryProfile>,
    settings: DashMap<String, PreferenceFlags>,
    trips: DashMap<String, Trip>,
    support_sessions: DashMap<String, String>,
}

impl MemoryRecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, user_id: impl Into<String>, profile: MemoryProfile) {
        self.profiles.insert(user_id.into(), profile);
    }

    pub fn set_preferences(&self, user_id: impl Into<String>, flags: PreferenceFlags) {
        self.settings.insert(user_id.into(), flags);
    }

    pub fn insert_trip(&self, trip: Trip) {
        self.trips.insert(trip.id.clone(), trip);
    }

    pub fn insert_support_session(&self, session_id: impl Into<String>, subject: impl Into<String>) {
        self.support_sessions.insert(session_id.into(), subject.into());
    }
}

#[async_trait]
impl RecipientStore for MemoryRecipientStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn recipients(&self, user_ids: &[String]) -> Result<Vec<Recipient>, PreferenceLookupError> {
        Ok(user_ids
            .iter()
            .map(|id| {
                let device_token = self
                    .profiles
                    .get(id)
                    .and_then(|p| p.device_token.clone());
                let preferences = self.settings.get(id).map(|s| *s);
                Recipient::new(id.clone(), device_token, preferences)
            })
            .collect())
    }

    async fn upcoming_trips(&self, lookahead_days: i64) -> Result<Vec<Trip>, PreferenceLookupError> {
        let today = Utc::now().date_naive();
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|entry| entry.is_upcoming(today, lookahead_days))
            .map(|entry| entry.value().clone())
            .collect();
        trips.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(trips)
    }

    async fn email_contact(&self, user_id: &str) -> Result<Option<EmailContact>, PreferenceLookupError> {
        Ok(self.profiles.get(user_id).map(|profile| EmailContact {
            user_id: user_id.to_string(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            preferences: self.settings.get(user_id).map(|s| *s),
        }))
    }

    async fn support_subject(&self, session_id: &str) -> Result<Option<String>, PreferenceLookupError> {
        Ok(self.support_sessions.get(session_id).map(|s| s.clone()))
    }
}
