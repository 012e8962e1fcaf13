use std::time::Instant;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::metrics::CredentialMetrics;

use super::assertion::{sign_assertion, AssertionClaims, ASSERTION_LIFETIME_SECS};
use super::{BearerToken, CredentialError, SigningIdentity, TokenSource};

/// OAuth 2.0 JWT-bearer grant (RFC 7523)
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Upper bound on an advertised token lifetime
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Trades a self-signed assertion for a bearer token. Holds no token state;
/// every call signs and exchanges anew.
pub struct CredentialExchanger {
    identity: SigningIdentity,
    client: reqwest::Client,
}

impl CredentialExchanger {
    pub fn new(identity: SigningIdentity, client: reqwest::Client) -> Self {
        Self { identity, client }
    }

    pub fn issuer(&self) -> &str {
        self.identity.issuer()
    }

    #[tracing::instrument(
        name = "credentials.exchange",
        skip(self),
        fields(issuer = %self.identity.issuer())
    )]
    pub async fn exchange(&self) -> Result<BearerToken, CredentialError> {
        let started = Instant::now();
        let result = self.sign_and_exchange().await;

        let label = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        CredentialMetrics::record_exchange(label, started.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            tracing::warn!(error = %e, "Token exchange failed");
        }

        result
    }

    async fn sign_and_exchange(&self) -> Result<BearerToken, CredentialError> {
        let now = Utc::now();
        let claims = AssertionClaims::new(&self.identity, now.timestamp());
        let assertion = sign_assertion(&claims, self.identity.private_key_pem())?;

        let response = self
            .client
            .post(self.identity.audience())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %detail, "Token endpoint rejected assertion");
            return Err(CredentialError::ExchangeRejected {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|_| CredentialError::MalformedResponse)?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(CredentialError::MalformedResponse)?;
        let lifetime = token_lifetime(body.expires_in);

        tracing::debug!(expires_in = lifetime.num_seconds(), "Obtained bearer token");

        Ok(BearerToken::new(access_token, now + lifetime))
    }
}

/// `expires_in` clamped to `0..=MAX_TOKEN_LIFETIME_SECS`; absent means the
/// assertion lifetime.
fn token_lifetime(expires_in: Option<i64>) -> Duration {
    let secs = expires_in
        .unwrap_or(ASSERTION_LIFETIME_SECS)
        .clamp(0, MAX_TOKEN_LIFETIME_SECS);
    Duration::seconds(secs)
}

#[async_trait]
impl TokenSource for CredentialExchanger {
    async fn token(&self) -> Result<BearerToken, CredentialError> {
        self.exchange().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_key_fails_before_network() {
        // Port 9 (discard) is never contacted: signing fails first
        let identity = SigningIdentity::new(
            "push@waylo-test.iam.gserviceaccount.com",
            "garbage",
            "http://127.0.0.1:9/token",
            "scope",
        );
        let exchanger = CredentialExchanger::new(identity, reqwest::Client::new());

        let result = exchanger.exchange().await;
        assert!(matches!(result, Err(CredentialError::SigningFailed(_))));
    }

    #[test]
    fn test_token_lifetime_is_clamped() {
        assert_eq!(token_lifetime(None), Duration::seconds(ASSERTION_LIFETIME_SECS));
        assert_eq!(token_lifetime(Some(1800)), Duration::seconds(1800));
        assert_eq!(token_lifetime(Some(i64::MAX)), Duration::seconds(MAX_TOKEN_LIFETIME_SECS));
        assert_eq!(token_lifetime(Some(i64::MIN)), Duration::zero());
    }

    #[test]
    fn test_token_response_tolerates_missing_fields() {
        let body: TokenResponse = serde_json::from_str(r#"{"token_type":"Bearer"}"#).unwrap();
        assert!(body.access_token.is_none());
        assert!(body.expires_in.is_none());
    }
}
