//! Prometheus metrics for the notification service.
//!
//! - Push metrics (outcomes by category, per-delivery latency, batches)
//! - Credential metrics (token exchanges by result, exchange latency, cache hits)
//! - Store and upstream API metrics
//! - HTTP handler invocations

mod helpers;

pub use helpers::{
    encode_metrics, BackendMetrics, CredentialMetrics, HttpMetrics, MemoryMetrics, PushMetrics,
    UpstreamMetrics,
};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "waylo";

lazy_static! {
    // ============================================================================
    // Push Metrics
    // ============================================================================

    /// Recipient outcomes by category and result (sent, failed, suppressed)
    pub static ref PUSH_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_push_outcomes_total", METRIC_PREFIX),
        "Push recipient outcomes",
        &["category", "outcome"]
    ).unwrap();

    /// Fan-out batches dispatched
    pub static ref PUSH_BATCHES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_batches_total", METRIC_PREFIX),
        "Total push batches dispatched"
    ).unwrap();

    /// Latency of a single delivery call
    pub static ref PUSH_DELIVERY_LATENCY: Histogram = register_histogram!(
        format!("{}_push_delivery_latency_seconds", METRIC_PREFIX),
        "Push delivery call latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Credential Metrics
    // ============================================================================

    /// Token exchange attempts by result
    pub static ref TOKEN_EXCHANGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_token_exchanges_total", METRIC_PREFIX),
        "Total OAuth token exchange attempts",
        &["result"]
    ).unwrap();

    /// Token exchange latency
    pub static ref TOKEN_EXCHANGE_LATENCY: Histogram = register_histogram!(
        format!("{}_token_exchange_latency_seconds", METRIC_PREFIX),
        "OAuth token exchange latency in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    /// Bearer tokens served from the cache
    pub static ref TOKEN_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_token_cache_hits_total", METRIC_PREFIX),
        "Total bearer tokens reused from the cache"
    ).unwrap();

    // ============================================================================
    // Upstream Metrics
    // ============================================================================

    /// Calls to third-party APIs (weather, tips, email) by result
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_upstream_requests_total", METRIC_PREFIX),
        "Total upstream API requests",
        &["service", "result"]
    ).unwrap();

    // ============================================================================
    // Backend Metrics
    // ============================================================================

    /// Store operation latency
    pub static ref BACKEND_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_backend_operation_latency_seconds", METRIC_PREFIX),
        "Backend operation latency in seconds",
        &["backend", "operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    ).unwrap();

    /// Store operation errors
    pub static ref BACKEND_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_backend_errors_total", METRIC_PREFIX),
        "Total backend operation errors",
        &["backend", "operation"]
    ).unwrap();

    // ============================================================================
    // HTTP API Metrics
    // ============================================================================

    /// Routed responses by route template and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_http_requests_total", METRIC_PREFIX),
        "Total HTTP responses by route and status",
        &["endpoint", "status"]
    ).unwrap();

    // ============================================================================
    // Process Metrics
    // ============================================================================

    /// Process memory usage (resident set size) in bytes
    pub static ref PROCESS_MEMORY_BYTES: IntGauge = register_int_gauge!(
        format!("{}_process_memory_bytes", METRIC_PREFIX),
        "Process memory usage (RSS) in bytes"
    ).unwrap();
}
