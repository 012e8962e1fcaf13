//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

/// Which integrations are wired. An unconfigured component is reported, not
/// treated as unhealthy, except push which every trigger but email needs.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub push: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_error: Option<String>,
    pub store: &'static str,
    pub weather: bool,
    pub email: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    /// `None` when push is not configured
    pub push: Option<DispatcherStatsSnapshot>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let push = state.push_dispatcher();
    let status = if push.is_ok() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentHealth {
            push: push.is_ok(),
            push_error: push.err().map(|e| e.to_string()),
            store: state.store.backend(),
            weather: state.weather.is_some(),
            email: state
                .settings
                .email
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty()),
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        push: state.push_dispatcher().ok().map(|d| d.stats()),
    })
}
