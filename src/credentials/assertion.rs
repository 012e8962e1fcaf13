use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{crypto, Algorithm, EncodingKey};
use serde::Serialize;

use super::{CredentialError, SigningIdentity};

/// Lifetime requested for each assertion, in seconds
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionHeader {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: AssertionHeader = AssertionHeader {
    alg: "RS256",
    typ: "JWT",
};

/// Claims of a JWT-bearer grant assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(identity: &SigningIdentity, issued_at: i64) -> Self {
        Self {
            iss: identity.issuer().to_string(),
            scope: identity.scope().to_string(),
            aud: identity.audience().to_string(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, CredentialError> {
    let json = serde_json::to_vec(value).map_err(|e| CredentialError::SigningFailed(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// `base64url(header) "." base64url(claims)`, the signing input.
pub fn unsigned_assertion(claims: &AssertionClaims) -> Result<String, CredentialError> {
    Ok(format!("{}.{}", encode_segment(&HEADER)?, encode_segment(claims)?))
}

/// Sign the claims with an RSA private key (PEM, PKCS#1 or PKCS#8) using
/// RSASSA-PKCS1-v1_5 / SHA-256 and append the signature segment.
pub fn sign_assertion(claims: &AssertionClaims, private_key_pem: &str) -> Result<String, CredentialError> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| CredentialError::SigningFailed(format!("invalid private key: {}", e)))?;

    let signing_input = unsigned_assertion(claims)?;
    let signature = crypto::sign(signing_input.as_bytes(), &key, Algorithm::RS256)
        .map_err(|e| CredentialError::SigningFailed(e.to_string()))?;

    Ok(format!("{}.{}", signing_input, signature))
}
