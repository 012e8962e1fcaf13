// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain
pub mod credentials;
pub mod email;
pub mod notification;
pub mod sources;
pub mod store;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;
