use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::store::PreferenceLookupError;

/// Missing or unusable deployment configuration. Fatal before any recipient
/// is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("push signing credentials are not configured")]
    MissingSigningKey,

    #[error("invalid service account: {0}")]
    InvalidServiceAccount(String),

    #[error("{0} is not configured")]
    MissingSetting(&'static str),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lookup error: {0}")]
    Lookup(#[from] PreferenceLookupError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn redacted(detail: String, generic: &str) -> String {
    if is_production() {
        generic.to_string()
    } else {
        detail
    }
}

impl AppError {
    /// Machine-readable code returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) | AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Credential(_) => "CREDENTIAL_UNAVAILABLE",
            AppError::Auth(_) => "UNAUTHORIZED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Lookup(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Credential(_) => StatusCode::BAD_GATEWAY,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Lookup(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let log_message = self.to_string();

        let client_message = match &self {
            AppError::Config(e) => redacted(e.to_string(), "Configuration error"),
            AppError::Configuration(e) => e.to_string(),
            AppError::Credential(e) => {
                redacted(e.to_string(), "Push credentials could not be obtained")
            }
            AppError::Auth(msg) | AppError::Validation(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Lookup(e) => redacted(e.to_string(), "Service temporarily unavailable"),
            AppError::Internal(msg) => redacted(msg.clone(), "Internal server error"),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::from(ConfigurationError::MissingSigningKey);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        let err = AppError::from(CredentialError::ExchangeRejected { status: 401 });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "CREDENTIAL_UNAVAILABLE");

        let err = AppError::Validation("title is required".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("User not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
