use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::metrics::CredentialMetrics;

use super::{BearerToken, CredentialError, TokenSource};

/// Minimum remaining lifetime for a cached token to be handed out again
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Reuses the last token of one signing identity across batches.
///
/// The lock is held across the refresh so concurrent batches mint at most
/// one token.
pub struct CachedTokenSource {
    inner: Arc<dyn TokenSource>,
    slot: Mutex<Option<BearerToken>>,
    margin: Duration,
}

impl CachedTokenSource {
    pub fn new(inner: Arc<dyn TokenSource>) -> Self {
        Self {
            inner,
            slot: Mutex::new(None),
            margin: Duration::seconds(REFRESH_MARGIN_SECS),
        }
    }

    /// Drop the cached token, e.g. after the provider rejects it
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}

#[async_trait]
impl TokenSource for CachedTokenSource {
    async fn token(&self) -> Result<BearerToken, CredentialError> {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.is_valid_at(Utc::now(), self.margin) {
                CredentialMetrics::record_cache_hit();
                return Ok(token.clone());
            }
            tracing::debug!(expires_at = %token.expires_at(), "Cached bearer token near expiry, refreshing");
        }

        let fresh = self.inner.token().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }
}
