//! Profile, preference and trip lookups.
//!
//! # Backends
//!
//! - `PostgresRecipientStore`: runtime queries against the app database
//! - `MemoryRecipientStore`: DashMap tables for development and tests
//!
//! Use `create_recipient_store()` to pick one from configuration.

mod memory;
mod postgres;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::metrics::BackendMetrics;
use crate::notification::{PreferenceFlags, Recipient};

pub use memory::{MemoryProfile, MemoryRecipientStore};
pub use postgres::PostgresRecipientStore;

#[derive(Debug, Error)]
pub enum PreferenceLookupError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Trip with destination coordinates, eligible for weather checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub owner_id: String,
    /// `planning` or `active`
    pub status: String,
    pub start_date: Option<NaiveDate>,
}

impl Trip {
    /// Planning trips starting within the window, or any active trip.
    pub fn is_upcoming(&self, today: NaiveDate, lookahead_days: i64) -> bool {
        match self.status.as_str() {
            "active" => true,
            "planning" => self
                .start_date
                .map(|start| start <= today + chrono::Duration::days(lookahead_days))
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Email delivery details for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContact {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// `None` when the user has no settings row
    pub preferences: Option<PreferenceFlags>,
}

#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Backend name used in logs and metrics
    fn backend(&self) -> &'static str;

    /// One recipient per requested id, in request order. Missing profile
    /// means no device token; missing settings row means no flags.
    async fn recipients(&self, user_ids: &[String]) -> Result<Vec<Recipient>, PreferenceLookupError>;

    async fn upcoming_trips(&self, lookahead_days: i64) -> Result<Vec<Trip>, PreferenceLookupError>;

    /// `None` when the user has no profile
    async fn email_contact(&self, user_id: &str) -> Result<Option<EmailContact>, PreferenceLookupError>;

    async fn support_subject(&self, session_id: &str) -> Result<Option<String>, PreferenceLookupError>;
}

/// Read recipients, degrading to "no preferences" (all suppressed) when the
/// store fails. The result always has one entry per id, in order.
pub async fn load_recipients(store: &dyn RecipientStore, user_ids: &[String]) -> Vec<Recipient> {
    let started = Instant::now();
    let result = store.recipients(user_ids).await;
    BackendMetrics::record_latency(store.backend(), "recipients", started.elapsed().as_secs_f64());

    match result {
        Ok(found) => {
            let mut by_id: HashMap<String, Recipient> = found
                .into_iter()
                .map(|r| (r.user_id.clone(), r))
                .collect();
            user_ids
                .iter()
                .map(|id| by_id.remove(id).unwrap_or_else(|| Recipient::unknown(id.clone())))
                .collect()
        }
        Err(e) => {
            BackendMetrics::record_error(store.backend(), "recipients");
            tracing::warn!(
                error = %e,
                backend = store.backend(),
                count = user_ids.len(),
                "Preference lookup failed, suppressing all recipients"
            );
            user_ids.iter().cloned().map(Recipient::unknown).collect()
        }
    }
}

/// Create a recipient store based on configuration.
///
/// - `"postgres"`: lazily connecting pool; failures surface per query
/// - `"memory"`: empty in-memory tables
///
/// Falls back to memory when the postgres pool cannot be built.
pub fn create_recipient_store(config: &DatabaseConfig) -> Arc<dyn RecipientStore> {
    match config.backend.as_str() {
        "postgres" => match PostgresRecipientStore::connect_lazy(config) {
            Ok(store) => {
                tracing::info!(
                    backend = "postgres",
                    pool_size = config.pool_size,
                    url = %postgres::mask_url(&config.url),
                    "Creating PostgreSQL recipient store"
                );
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "PostgreSQL recipient store unavailable, falling back to memory"
                );
                Arc::new(MemoryRecipientStore::new())
            }
        },
        _ => {
            tracing::info!(backend = "memory", "Creating memory recipient store");
            Arc::new(MemoryRecipientStore::new())
        }
    }
}
