//! Short-lived bearer credentials for the push provider.
//!
//! A long-lived service account key signs a JWT-bearer assertion which is
//! exchanged with the authorization server for an access token:
//!
//! - `assertion`: pure assertion building and RS256 signing (no I/O)
//! - `exchanger`: the form-encoded token exchange over HTTP
//! - `cache`: optional reuse of a token across batches until it nears expiry

mod assertion;
mod cache;
mod exchanger;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::config::ServiceAccount;

pub use assertion::{sign_assertion, unsigned_assertion, AssertionClaims, ASSERTION_LIFETIME_SECS};
pub use cache::{CachedTokenSource, REFRESH_MARGIN_SECS};
pub use exchanger::{CredentialExchanger, JWT_BEARER_GRANT_TYPE};

/// Errors raised while minting a bearer token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The private key could not be parsed or the signature failed
    #[error("failed to sign assertion: {0}")]
    SigningFailed(String),

    /// The token endpoint answered with a non-success status
    #[error("token endpoint rejected the assertion with status {status}")]
    ExchangeRejected { status: u16 },

    /// The token endpoint answered 2xx without an access token
    #[error("token endpoint response did not contain an access token")]
    MalformedResponse,

    /// The token endpoint could not be reached
    #[error("token endpoint unreachable: {0}")]
    Unreachable(String),
}

impl CredentialError {
    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialError::SigningFailed(_) => "signing_failed",
            CredentialError::ExchangeRejected { .. } => "rejected",
            CredentialError::MalformedResponse => "malformed",
            CredentialError::Unreachable(_) => "unreachable",
        }
    }
}

/// Long-lived signing material. Only the credential exchanger reads it.
#[derive(Clone)]
pub struct SigningIdentity {
    issuer: String,
    private_key_pem: String,
    audience: String,
    scope: String,
}

impl SigningIdentity {
    pub fn new(
        issuer: impl Into<String>,
        private_key_pem: impl Into<String>,
        audience: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            private_key_pem: private_key_pem.into(),
            audience: audience.into(),
            scope: scope.into(),
        }
    }

    /// Build the identity from a service account. `token_endpoint` overrides
    /// the account's `token_uri`, which is both the audience and the
    /// exchange URL.
    pub fn from_service_account(
        account: &ServiceAccount,
        scope: &str,
        token_endpoint: Option<&str>,
    ) -> Self {
        Self::new(
            account.client_email.clone(),
            account.private_key.clone(),
            token_endpoint.unwrap_or(&account.token_uri).to_string(),
            scope.to_string(),
        )
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    fn audience(&self) -> &str {
        &self.audience
    }

    fn scope(&self) -> &str {
        &self.scope
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Access token accepted by the push provider.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the token stays valid for at least `margin` after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - now > margin
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Anything that can hand out a bearer token for one batch of deliveries.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<BearerToken, CredentialError>;
}
