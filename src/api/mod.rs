//! API layer - service endpoints and route table.

mod health;
mod metrics;
mod routes;

pub use health::{health, stats, ComponentHealth, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
