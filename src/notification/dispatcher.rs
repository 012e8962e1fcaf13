use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::credentials::{BearerToken, CredentialError, TokenSource};
use crate::metrics::PushMetrics;

use super::preferences::{check_push, Recipient, SuppressionReason};
use super::provider::{DeliveryError, PushProvider};
use super::routing::channel_for;
use super::{NotificationCategory, NotificationMessage};

/// Default cap on in-flight delivery calls per batch
pub const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 32;

/// Default per-call timeout
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub max_concurrent_deliveries: usize,
    pub delivery_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deliveries: DEFAULT_MAX_CONCURRENT_DELIVERIES,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

/// Why an eligible recipient did not get the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No bearer token could be obtained for the batch
    CredentialUnavailable,
    Rejected { status: u16 },
    Transport { detail: String },
    Timeout,
}

impl From<DeliveryError> for FailureReason {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Rejected { status } => FailureReason::Rejected { status },
            DeliveryError::Transport(detail) => FailureReason::Transport { detail },
            DeliveryError::Timeout => FailureReason::Timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Suppressed(SuppressionReason),
    Failed(FailureReason),
}

impl DeliveryOutcome {
    fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "sent",
            DeliveryOutcome::Suppressed(_) => "suppressed",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub user_id: String,
    pub outcome: DeliveryOutcome,
}

/// Aggregate counts of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub suppressed: usize,
    pub total: usize,
}

/// Result of one fan-out. Outcomes are in recipient order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub outcomes: Vec<RecipientOutcome>,
    /// Set when the batch could not obtain a bearer token
    #[serde(skip)]
    pub credential_error: Option<CredentialError>,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..BatchSummary::default()
        };
        for entry in &self.outcomes {
            match entry.outcome {
                DeliveryOutcome::Sent => summary.sent += 1,
                DeliveryOutcome::Suppressed(_) => summary.suppressed += 1,
                DeliveryOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn outcome_for(&self, user_id: &str) -> Option<&DeliveryOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.user_id == user_id)
            .map(|o| &o.outcome)
    }
}

/// Process-wide counters
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub batches: AtomicU64,
    pub sent: AtomicU64,
    pub failed: AtomicU64,
    pub suppressed: AtomicU64,
    pub credential_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            credential_failures: self.credential_failures.load(Ordering::Relaxed),
        }
    }

    fn record(&self, summary: &BatchSummary, credential_failed: bool) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.sent.fetch_add(summary.sent as u64, Ordering::Relaxed);
        self.failed.fetch_add(summary.failed as u64, Ordering::Relaxed);
        self.suppressed.fetch_add(summary.suppressed as u64, Ordering::Relaxed);
        if credential_failed {
            self.credential_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub batches: u64,
    pub sent: u64,
    pub failed: u64,
    pub suppressed: u64,
    pub credential_failures: u64,
}

/// Fans one notification out to many recipients.
///
/// Recipients are filtered by preference first; suppressed ones never cost a
/// network call. One bearer token is obtained per batch and shared read-only
/// by every delivery call. Calls run concurrently (bounded) and each one is
/// isolated: its failure or timeout only affects its own outcome.
pub struct FanoutDispatcher {
    tokens: Arc<dyn TokenSource>,
    provider: Arc<dyn PushProvider>,
    config: DispatcherConfig,
    stats: DispatcherStats,
}

impl FanoutDispatcher {
    pub fn new(tokens: Arc<dyn TokenSource>, provider: Arc<dyn PushProvider>) -> Self {
        Self::with_config(tokens, provider, DispatcherConfig::default())
    }

    pub fn with_config(
        tokens: Arc<dyn TokenSource>,
        provider: Arc<dyn PushProvider>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            tokens,
            provider,
            config,
            stats: DispatcherStats::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, message, recipients),
        fields(
            batch_id = tracing::field::Empty,
            category = %message.category,
            recipient_count = recipients.len()
        )
    )]
    pub async fn dispatch(&self, message: &NotificationMessage, recipients: &[Recipient]) -> BatchResult {
        let batch_id = Uuid::new_v4();
        tracing::Span::current().record("batch_id", tracing::field::display(batch_id));

        let mut outcomes: Vec<Option<DeliveryOutcome>> = vec![None; recipients.len()];
        let mut eligible: Vec<(usize, &str)> = Vec::new();

        for (index, recipient) in recipients.iter().enumerate() {
            match self.partition(recipient, &message.category) {
                Ok(device_token) => eligible.push((index, device_token)),
                Err(reason) => {
                    tracing::debug!(
                        user_id = %recipient.user_id,
                        reason = reason.as_str(),
                        "Recipient suppressed"
                    );
                    outcomes[index] = Some(DeliveryOutcome::Suppressed(reason));
                }
            }
        }

        let mut credential_error = None;
        if !eligible.is_empty() {
            match self.tokens.token().await {
                Ok(token) => {
                    for (index, outcome) in self.deliver_all(&token, message, &eligible).await {
                        outcomes[index] = Some(outcome);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        eligible = eligible.len(),
                        "No bearer token for batch, failing all eligible recipients"
                    );
                    for (index, _) in &eligible {
                        outcomes[*index] =
                            Some(DeliveryOutcome::Failed(FailureReason::CredentialUnavailable));
                    }
                    credential_error = Some(e);
                }
            }
        }

        let outcomes: Vec<RecipientOutcome> = recipients
            .iter()
            .zip(outcomes)
            .map(|(recipient, outcome)| RecipientOutcome {
                user_id: recipient.user_id.clone(),
                outcome: outcome
                    .unwrap_or(DeliveryOutcome::Failed(FailureReason::CredentialUnavailable)),
            })
            .collect();

        let result = BatchResult {
            batch_id,
            outcomes,
            credential_error,
        };
        let summary = result.summary();

        self.stats.record(&summary, result.credential_error.is_some());
        PushMetrics::record_batch();
        let category_label = NotificationCategory::metric_label(&message.category);
        for entry in &result.outcomes {
            PushMetrics::record_outcome(category_label, entry.outcome.label());
        }

        tracing::info!(
            batch_id = %batch_id,
            sent = summary.sent,
            failed = summary.failed,
            suppressed = summary.suppressed,
            total = summary.total,
            "Push batch dispatched"
        );

        result
    }

    /// Eligible recipients yield their device token.
    fn partition<'r>(&self, recipient: &'r Recipient, category: &str) -> Result<&'r str, SuppressionReason> {
        check_push(recipient, category)?;
        recipient
            .device_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SuppressionReason::NoDeviceToken)
    }

    /// Issue every delivery call with at most `max_concurrent_deliveries` in flight.
    async fn deliver_all(
        &self,
        token: &BearerToken,
        message: &NotificationMessage,
        eligible: &[(usize, &str)],
    ) -> Vec<(usize, DeliveryOutcome)> {
        let channel_id = channel_for(&message.category);
        let limit = self.config.max_concurrent_deliveries.max(1);

        let mut results = Vec::with_capacity(eligible.len());
        let mut in_flight = FuturesUnordered::new();

        for &(index, device_token) in eligible {
            in_flight.push(self.deliver_one(token, index, device_token, message, channel_id));

            while in_flight.len() >= limit {
                match in_flight.next().await {
                    Some(result) => results.push(result),
                    None => break,
                }
            }
        }

        while let Some(result) = in_flight.next().await {
            results.push(result);
        }

        results
    }

    async fn deliver_one(
        &self,
        token: &BearerToken,
        index: usize,
        device_token: &str,
        message: &NotificationMessage,
        channel_id: &str,
    ) -> (usize, DeliveryOutcome) {
        let started = Instant::now();
        let call = self.provider.deliver(token, device_token, message, channel_id);

        let outcome = match tokio::time::timeout(self.config.delivery_timeout, call).await {
            Ok(Ok(())) => DeliveryOutcome::Sent,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Push delivery failed");
                DeliveryOutcome::Failed(e.into())
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.delivery_timeout.as_millis() as u64,
                    "Push delivery timed out"
                );
                DeliveryOutcome::Failed(FailureReason::Timeout)
            }
        };

        PushMetrics::observe_delivery_latency(started.elapsed().as_secs_f64());
        (index, outcome)
    }
}
