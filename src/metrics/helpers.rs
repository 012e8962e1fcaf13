//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    BACKEND_ERRORS_TOTAL, BACKEND_OPERATION_LATENCY, HTTP_REQUESTS_TOTAL, PROCESS_MEMORY_BYTES,
    PUSH_BATCHES_TOTAL, PUSH_DELIVERY_LATENCY, PUSH_OUTCOMES_TOTAL, TOKEN_CACHE_HITS_TOTAL,
    TOKEN_EXCHANGES_TOTAL, TOKEN_EXCHANGE_LATENCY, UPSTREAM_REQUESTS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording push metrics
pub struct PushMetrics;

impl PushMetrics {
    /// Record one recipient outcome. `category` must be a bounded label.
    pub fn record_outcome(category: &str, outcome: &str) {
        PUSH_OUTCOMES_TOTAL
            .with_label_values(&[category, outcome])
            .inc();
    }

    pub fn record_batch() {
        PUSH_BATCHES_TOTAL.inc();
    }

    pub fn observe_delivery_latency(latency_secs: f64) {
        PUSH_DELIVERY_LATENCY.observe(latency_secs);
    }
}

/// Helper struct for token exchange metrics
pub struct CredentialMetrics;

impl CredentialMetrics {
    /// Record an exchange attempt and its latency
    pub fn record_exchange(result: &str, latency_secs: f64) {
        TOKEN_EXCHANGES_TOTAL.with_label_values(&[result]).inc();
        TOKEN_EXCHANGE_LATENCY.observe(latency_secs);
    }

    pub fn record_cache_hit() {
        TOKEN_CACHE_HITS_TOTAL.inc();
    }
}

/// Helper struct for third-party API calls
pub struct UpstreamMetrics;

impl UpstreamMetrics {
    pub fn record_success(service: &str) {
        UPSTREAM_REQUESTS_TOTAL
            .with_label_values(&[service, "success"])
            .inc();
    }

    pub fn record_failure(service: &str) {
        UPSTREAM_REQUESTS_TOTAL
            .with_label_values(&[service, "failure"])
            .inc();
    }
}

/// Helper struct for store backend metrics
pub struct BackendMetrics;

impl BackendMetrics {
    /// Record backend operation latency
    pub fn record_latency(backend: &str, operation: &str, latency_secs: f64) {
        BACKEND_OPERATION_LATENCY
            .with_label_values(&[backend, operation])
            .observe(latency_secs);
    }

    /// Record backend error
    pub fn record_error(backend: &str, operation: &str) {
        BACKEND_ERRORS_TOTAL
            .with_label_values(&[backend, operation])
            .inc();
    }
}

/// Helper struct for HTTP handler metrics
pub struct HttpMetrics;

impl HttpMetrics {
    pub fn record_request(endpoint: &str, status: u16) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }
}

/// Helper struct for memory metrics
pub struct MemoryMetrics;

impl MemoryMetrics {
    /// Refresh the RSS gauge. Only implemented on Linux.
    pub fn update_process_memory() {
        #[cfg(target_os = "linux")]
        {
            if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
                let rss_kb = status
                    .lines()
                    .find(|line| line.starts_with("VmRSS:"))
                    .and_then(|line| line.split_whitespace().nth(1))
                    .and_then(|kb| kb.parse::<i64>().ok());
                if let Some(kb) = rss_kb {
                    PROCESS_MEMORY_BYTES.set(kb * 1024);
                }
            }
        }
    }
}
