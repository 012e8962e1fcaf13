use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, track_http_metrics, AppState};
use crate::triggers::{check_weather, daily_tip, send_push, support_email};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Notification triggers
        .nest(
            "/api/v1",
            Router::new()
                .route("/push/send", post(send_push))
                .route("/weather/check", post(check_weather))
                .route("/tips/daily", post(daily_tip))
                .route("/support/email", post(support_email))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
        .route_layer(middleware::from_fn(track_http_metrics))
}
