//! PostgreSQL recipient store.
//!
//! Reads the app's `profiles`, `notification_settings`, `trips` and
//! `support_sessions` tables. Ids are compared as text so malformed ids
//! simply match nothing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::config::DatabaseConfig;
use crate::notification::{PreferenceFlags, Recipient};

use super::{EmailContact, PreferenceLookupError, RecipientStore, Trip};

const RECIPIENTS_QUERY: &str = r#"
    SELECT
        ids.user_id,
        p.fcm_token,
        s.user_id IS NOT NULL AS has_settings,
        COALESCE(s.master_enabled, false) AS master_enabled,
        COALESCE(s.push_notifications, false) AS push_enabled,
        COALESCE(s.email_notifications, false) AS email_enabled,
        COALESCE(s.weather_warnings, false) AS weather_warnings,
        COALESCE(s.trip_reminders, false) AS trip_reminders,
        COALESCE(s.budget_alerts, false) AS budget_alerts,
        COALESCE(s.journal_prompts, false) AS journal_prompts,
        COALESCE(s.support_reply_notifications, false) AS support_replies,
        COALESCE(s.ticket_status_updates, false) AS ticket_updates,
        COALESCE(s.daily_tips, false) AS daily_tips
    FROM unnest($1::text[]) WITH ORDINALITY AS ids(user_id, ord)
    LEFT JOIN profiles p ON p.id::text = ids.user_id
    LEFT JOIN notification_settings s ON s.user_id::text = ids.user_id
    ORDER BY ids.ord
"#;

const UPCOMING_TRIPS_QUERY: &str = r#"
    SELECT
        id::text AS id,
        title,
        destination,
        destination_lat,
        destination_lng,
        owner_id::text AS owner_id,
        status,
        start_date
    FROM trips
    WHERE status IN ('planning', 'active')
      AND destination_lat IS NOT NULL
      AND destination_lng IS NOT NULL
      AND (start_date <= $1 OR status = 'active')
    ORDER BY start_date NULLS LAST, id
"#;

const EMAIL_CONTACT_QUERY: &str = r#"
    SELECT
        p.id::text AS user_id,
        COALESCE(u.email, p.email) AS email,
        p.full_name,
        s.user_id IS NOT NULL AS has_settings,
        COALESCE(s.master_enabled, false) AS master_enabled,
        COALESCE(s.push_notifications, false) AS push_enabled,
        COALESCE(s.email_notifications, false) AS email_enabled,
        COALESCE(s.weather_warnings, false) AS weather_warnings,
        COALESCE(s.trip_reminders, false) AS trip_reminders,
        COALESCE(s.budget_alerts, false) AS budget_alerts,
        COALESCE(s.journal_prompts, false) AS journal_prompts,
        COALESCE(s.support_reply_notifications, false) AS support_replies,
        COALESCE(s.ticket_status_updates, false) AS ticket_updates,
        COALESCE(s.daily_tips, false) AS daily_tips
    FROM profiles p
    LEFT JOIN auth.users u ON u.id = p.id
    LEFT JOIN notification_settings s ON s.user_id = p.id
    WHERE p.id::text = $1
"#;

const SUPPORT_SUBJECT_QUERY: &str =
    "SELECT subject FROM support_sessions WHERE id::text = $1";

#[derive(Debug, FromRow)]
struct SettingsColumns {
    has_settings: bool,
    master_enabled: bool,
    push_enabled: bool,
    email_enabled: bool,
    weather_warnings: bool,
    trip_reminders: bool,
    budget_alerts: bool,
    journal_prompts: bool,
    support_replies: bool,
    ticket_updates: bool,
    daily_tips: bool,
}

impl SettingsColumns {
    fn into_flags(self) -> Option<PreferenceFlags> {
        self.has_settings.then_some(PreferenceFlags {
            master_enabled: self.master_enabled,
            push_enabled: self.push_enabled,
            email_enabled: self.email_enabled,
            weather_warnings: self.weather_warnings,
            trip_reminders: self.trip_reminders,
            budget_alerts: self.budget_alerts,
            journal_prompts: self.journal_prompts,
            support_replies: self.support_replies,
            ticket_updates: self.ticket_updates,
            daily_tips: self.daily_tips,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecipientRow {
    user_id: String,
    fcm_token: Option<String>,
    #[sqlx(flatten)]
    settings: SettingsColumns,
}

#[derive(Debug, FromRow)]
struct TripRow {
    id: String,
    title: String,
    destination: String,
    destination_lat: f64,
    destination_lng: f64,
    owner_id: String,
    status: String,
    start_date: Option<NaiveDate>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            title: row.title,
            destination: row.destination,
            destination_lat: row.destination_lat,
            destination_lng: row.destination_lng,
            owner_id: row.owner_id,
            status: row.status,
            start_date: row.start_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct EmailContactRow {
    user_id: String,
    email: Option<String>,
    full_name: Option<String>,
    #[sqlx(flatten)]
    settings: SettingsColumns,
}

pub struct PostgresRecipientStore {
    pool: PgPool,
}

impl PostgresRecipientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the pool without connecting; the first query opens a connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, PreferenceLookupError> {
        if config.url.trim().is_empty() {
            return Err(PreferenceLookupError::Unavailable(
                "database.url is not configured".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds as u64))
            .connect_lazy(&config.url)?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecipientStore for PostgresRecipientStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn recipients(&self, user_ids: &[String]) -> Result<Vec<Recipient>, PreferenceLookupError> {
        let rows: Vec<RecipientRow> = sqlx::query_as(RECIPIENTS_QUERY)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let device_token = row.fcm_token.filter(|t| !t.is_empty());
                Recipient::new(row.user_id, device_token, row.settings.into_flags())
            })
            .collect())
    }

    async fn upcoming_trips(&self, lookahead_days: i64) -> Result<Vec<Trip>, PreferenceLookupError> {
        let horizon = Utc::now().date_naive() + chrono::Duration::days(lookahead_days);

        let rows: Vec<TripRow> = sqlx::query_as(UPCOMING_TRIPS_QUERY)
            .bind(horizon)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn email_contact(&self, user_id: &str) -> Result<Option<EmailContact>, PreferenceLookupError> {
        let row: Option<EmailContactRow> = sqlx::query_as(EMAIL_CONTACT_QUERY)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| EmailContact {
            user_id: row.user_id,
            email: row.email.filter(|e| !e.is_empty()),
            full_name: row.full_name,
            preferences: row.settings.into_flags(),
        }))
    }

    async fn support_subject(&self, session_id: &str) -> Result<Option<String>, PreferenceLookupError> {
        let subject: Option<Option<String>> = sqlx::query_scalar(SUPPORT_SUBJECT_QUERY)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subject.flatten())
    }
}

/// Mask the password of a database URL for logging.
pub(super) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let prefix = &url[..colon_pos + 1];
            let suffix = &url[at_pos..];
            return format!("{}***{}", prefix, suffix);
        }
    }
    url.to_string()
}
