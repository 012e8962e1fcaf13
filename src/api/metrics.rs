//! Prometheus metrics endpoint.

use axum::{http::StatusCode, response::IntoResponse};

use crate::metrics::{self, MemoryMetrics};

/// GET /metrics - Prometheus metrics endpoint
pub async fn prometheus_metrics() -> impl IntoResponse {
    MemoryMetrics::update_process_memory();

    match metrics::encode_metrics() {
        Ok(output) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Prometheus metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
