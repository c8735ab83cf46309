//! Identity Verification
//!
//! Resolves bearer tokens issued by the upstream identity provider to a
//! verified principal. CreditGate never issues tokens itself; it only
//! validates what the IdP signed.

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};

use crate::shared::error::{PlatformError, Result};

/// An authenticated caller, as attested by the identity provider.
///
/// `subject` is the IdP's stable opaque identifier; `email` is the optional
/// display label carried on the account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPrincipal {
    pub subject: String,
    pub email: Option<String>,
}

/// Claims expected on an IdP-issued identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (stable principal identifier)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Contact email, when the IdP discloses one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Resolves a raw bearer token to a verified principal.
///
/// Implementations may go over the network (remote introspection, JWKS
/// refresh), so the seam is async. Must be safe for concurrent use by
/// independent request handlers.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedPrincipal>;
}

/// Configuration for the JWT verifier
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Shared HMAC secret agreed with the identity provider
    pub secret: String,

    /// Expected issuer claim
    pub issuer: String,

    /// Expected audience claim
    pub audience: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "creditgate".to_string(),
            audience: "creditgate".to_string(),
        }
    }
}

/// HS256 JWT verifier for IdP identity tokens
pub struct JwtIdentityVerifier {
    config: VerifierConfig,
    decoding_key: DecodingKey,
}

impl JwtIdentityVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self { config, decoding_key }
    }

    /// Validate an identity token and extract its claims
    pub fn validate_token(&self, token: &str) -> Result<IdentityClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<IdentityClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: format!("{}", e) },
            })
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedPrincipal> {
        let claims = self.validate_token(token)?;
        Ok(VerifiedPrincipal {
            subject: claims.sub,
            email: claims.email,
        })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    if auth_header.starts_with("Bearer ") {
        Some(&auth_header[7..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn test_config() -> VerifierConfig {
        VerifierConfig {
            secret: "test-secret".to_string(),
            ..VerifierConfig::default()
        }
    }

    fn sign(claims: &IdentityClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_for(sub: &str) -> IdentityClaims {
        let now = chrono::Utc::now().timestamp();
        IdentityClaims {
            sub: sub.to_string(),
            iss: "creditgate".to_string(),
            aud: "creditgate".to_string(),
            exp: now + 3600,
            iat: now,
            email: Some("user@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let verifier = JwtIdentityVerifier::new(test_config());
        let token = sign(&claims_for("user-1"), "test-secret");

        let principal = verifier.verify(&token).await.unwrap();
        assert_eq!(principal.subject, "user-1");
        assert_eq!(principal.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_secret() {
        let verifier = JwtIdentityVerifier::new(test_config());
        let token = sign(&claims_for("user-1"), "another-secret");

        assert!(verifier.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_rejects_expired_token() {
        let verifier = JwtIdentityVerifier::new(test_config());
        let mut claims = claims_for("user-1");
        claims.exp = claims.iat - 120;
        let token = sign(&claims, "test-secret");

        match verifier.verify(&token).await {
            Err(PlatformError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|p| p.subject)),
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
