//! Signed tokens: bearer access tokens and email-verification links.
//!
//! Both are HS256 JWTs signed with `JWT_SECRET`. Verification tokens carry a
//! `purpose` claim so one kind can never be accepted as the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use ticketwave_core::UserId;

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::User;

/// Lifetime of an email-verification link.
pub const VERIFICATION_TTL_HOURS: i64 = 24;

const EMAIL_VERIFICATION: &str = "email_verification";

/// Claims of a bearer access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: UserId,
    pub email: String,
    pub is_email_verified: bool,
    pub has_ticket: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct VerificationClaims {
    sub: UserId,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// Signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::hours(config.expires_in_hours),
        }
    }

    /// Issue an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        self.issue_access_at(user, Utc::now())
    }

    /// Issue an access token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_access_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.to_string(),
            is_email_verified: user.email_verified,
            has_ticket: user.has_ticket,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Decode and validate an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, expired or
    /// wrongly-signed token.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode(token)
    }

    /// Issue an email-verification token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_verification(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue_verification_at(user_id, Utc::now())
    }

    /// Issue an email-verification token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_verification_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = VerificationClaims {
            sub: user_id,
            purpose: EMAIL_VERIFICATION.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(VERIFICATION_TTL_HOURS)).timestamp(),
        };
        self.sign(&claims)
    }

    /// Decode a verification token, returning the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid, expired, or
    /// was not issued for email verification.
    pub fn decode_verification(&self, token: &str) -> Result<UserId, AuthError> {
        let claims: VerificationClaims = self.decode(token)?;
        if claims.purpose != EMAIL_VERIFICATION {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.sub)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::models::user::tests::user;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            expires_in_hours: 168,
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let keys = keys();
        let u = user(true, false);
        let token = keys.issue_access(&u).expect("signs");
        let claims = keys.decode_access(&token).expect("valid");

        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.email, u.email.as_str());
        assert!(claims.is_email_verified);
        assert!(!claims.has_ticket);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let keys = keys();
        let issued = Utc::now() - Duration::hours(169);
        let token = keys.issue_access_at(&user(true, true), issued).expect("signs");
        assert!(matches!(keys.decode_access(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let keys = keys();
        let u = user(false, false);

        let access = keys.issue_access(&u).expect("signs");
        assert!(keys.decode_verification(&access).is_err());

        let verification = keys.issue_verification(u.id).expect("signs");
        assert!(keys.decode_access(&verification).is_err());
        assert_eq!(keys.decode_verification(&verification).ok(), Some(u.id));
    }

    #[test]
    fn test_verification_expires_after_a_day() {
        let keys = keys();
        let token = keys
            .issue_verification_at(UserId::new(3), Utc::now() - Duration::hours(25))
            .expect("signs");
        assert!(keys.decode_verification(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = JwtKeys::new(&JwtConfig {
            secret: SecretString::from("zZ9!yY8@xX7#wW6$vV5%uU4^tT3&sS2*"),
            expires_in_hours: 1,
        });
        let token = other.issue_access(&user(true, true)).expect("signs");
        assert!(keys().decode_access(&token).is_err());
        assert!(keys().decode_access("not-a-jwt").is_err());
    }
}
