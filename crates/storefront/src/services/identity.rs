//! Google and Apple identity-token verification.
//!
//! Google ID tokens are checked against the `tokeninfo` endpoint. Apple
//! identity tokens are RS256 JWTs verified locally against Apple's published
//! key set, which is cached for an hour and refetched when an unknown key id
//! shows up.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use ticketwave_core::{Email, EmailError};

use crate::config::IdentityConfig;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";
const APPLE_ISSUER: &str = "https://appleid.apple.com";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Errors from identity-token verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Provider HTTP call failed.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the token or its claims don't match.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// JWT could not be decoded or verified.
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// No signing key matches the token's key id.
    #[error("unknown signing key")]
    UnknownKey,

    /// The identity carries no usable email.
    #[error("identity has no valid email: {0}")]
    Email(#[from] EmailError),
}

/// An identity confirmed by Google or Apple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider subject identifier.
    pub subject: String,
    pub email: Email,
    pub name: Option<String>,
}

/// `tokeninfo` response fields we rely on.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    iss: String,
    sub: String,
    email: Option<String>,
    /// Google sends this as the string `"true"`/`"false"`.
    email_verified: Option<String>,
    name: Option<String>,
}

impl GoogleTokenInfo {
    fn into_identity(self, audience: Option<&str>) -> Result<VerifiedIdentity, IdentityError> {
        if !GOOGLE_ISSUERS.contains(&self.iss.as_str()) {
            return Err(IdentityError::Rejected(format!("unexpected issuer {}", self.iss)));
        }
        if let Some(expected) = audience
            && self.aud != expected
        {
            return Err(IdentityError::Rejected("audience mismatch".to_string()));
        }
        if self.email_verified.as_deref() != Some("true") {
            return Err(IdentityError::Rejected("email not verified".to_string()));
        }

        let email = Email::parse(self.email.as_deref().unwrap_or_default())?;
        Ok(VerifiedIdentity {
            subject: self.sub,
            email,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AppleClaims {
    sub: String,
    email: Option<String>,
}

/// Verifies third-party identity tokens.
#[derive(Clone)]
pub struct IdentityVerifier {
    inner: Arc<IdentityVerifierInner>,
}

struct IdentityVerifierInner {
    client: reqwest::Client,
    google_client_id: Option<String>,
    apple_client_id: Option<String>,
    apple_keys: Cache<(), Arc<JwkSet>>,
}

impl IdentityVerifier {
    /// Create a verifier. Audiences are checked when client ids are configured.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let apple_keys = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(3600))
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(IdentityVerifierInner {
                client,
                google_client_id: config.google_client_id.clone(),
                apple_client_id: config.apple_client_id.clone(),
                apple_keys,
            }),
        }
    }

    /// Verify a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` if Google does not accept the token or
    /// its issuer, audience or email verification doesn't check out.
    #[instrument(skip_all)]
    pub async fn verify_google(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = Url::parse_with_params(GOOGLE_TOKENINFO_URL, &[("id_token", id_token)])
            .map_err(|e| IdentityError::Rejected(e.to_string()))?;
        let response = self.inner.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: GoogleTokenInfo = response.json().await?;
        info.into_identity(self.inner.google_client_id.as_deref())
    }

    /// Verify an Apple identity token.
    ///
    /// Apple only includes the user's name on the first authorization, so the
    /// returned identity never has one; callers pass it separately.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Jwt` if the signature, issuer, audience or
    /// expiry is invalid, and `IdentityError::UnknownKey` if Apple does not
    /// publish the signing key.
    #[instrument(skip_all)]
    pub async fn verify_apple(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = jsonwebtoken::decode_header(id_token)?;
        let kid = header.kid.ok_or(IdentityError::UnknownKey)?;

        let key = self.apple_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[APPLE_ISSUER]);
        match &self.inner.apple_client_id {
            Some(client_id) => validation.set_audience(&[client_id]),
            None => validation.validate_aud = false,
        }

        let claims = jsonwebtoken::decode::<AppleClaims>(id_token, &key, &validation)?.claims;
        let email = Email::parse(claims.email.as_deref().unwrap_or_default())?;

        Ok(VerifiedIdentity {
            subject: claims.sub,
            email,
            name: None,
        })
    }

    async fn apple_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        if let Some(keys) = self.inner.apple_keys.get(&()).await
            && let Some(jwk) = keys.find(kid)
        {
            return Ok(DecodingKey::from_jwk(jwk)?);
        }

        debug!(kid, "Fetching Apple signing keys");
        let keys: JwkSet = self
            .inner
            .client
            .get(APPLE_KEYS_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let keys = Arc::new(keys);
        self.inner.apple_keys.insert((), Arc::clone(&keys)).await;

        let jwk = keys.find(kid).ok_or(IdentityError::UnknownKey)?;
        Ok(DecodingKey::from_jwk(jwk)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, verified: &str, email: Option<&str>) -> GoogleTokenInfo {
        GoogleTokenInfo {
            aud: aud.to_string(),
            iss: "https://accounts.google.com".to_string(),
            sub: "1234567890".to_string(),
            email: email.map(str::to_string),
            email_verified: Some(verified.to_string()),
            name: Some("Jane Doe".to_string()),
        }
    }

    #[test]
    fn test_google_identity_accepted() {
        let identity = info("client-1", "true", Some("jane@x.com"))
            .into_identity(Some("client-1"))
            .expect("accepted");
        assert_eq!(identity.subject, "1234567890");
        assert_eq!(identity.email.as_str(), "jane@x.com");
        assert_eq!(identity.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_google_audience_checked_when_configured() {
        let result = info("other", "true", Some("jane@x.com")).into_identity(Some("client-1"));
        assert!(matches!(result, Err(IdentityError::Rejected(_))));

        let unchecked = info("other", "true", Some("jane@x.com")).into_identity(None);
        assert!(unchecked.is_ok());
    }

    #[test]
    fn test_google_requires_verified_email() {
        assert!(info("a", "false", Some("jane@x.com")).into_identity(None).is_err());
        assert!(matches!(
            info("a", "true", None).into_identity(None),
            Err(IdentityError::Email(_))
        ));
    }

    #[test]
    fn test_google_issuer_checked() {
        let mut bad = info("a", "true", Some("jane@x.com"));
        bad.iss = "https://evil.example".to_string();
        assert!(bad.into_identity(None).is_err());
    }

    #[test]
    fn test_tokeninfo_wire_format() {
        let json = r#"{"aud":"c","iss":"accounts.google.com","sub":"42","email":"a@b.co","email_verified":"true","exp":"1700000000"}"#;
        let parsed: GoogleTokenInfo = serde_json::from_str(json).expect("parses");
        assert_eq!(parsed.name, None);
        assert!(parsed.into_identity(Some("c")).is_ok());
    }

    #[tokio::test]
    async fn test_apple_rejects_malformed_token() {
        let verifier = IdentityVerifier::new(&IdentityConfig::default());
        assert!(matches!(
            verifier.verify_apple("garbage").await,
            Err(IdentityError::Jwt(_))
        ));
    }
}
