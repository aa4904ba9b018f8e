//! Authentication service.
//!
//! Password accounts with email verification, plus accounts created from a
//! verified Google or Apple identity.

mod error;
pub mod jwt;

pub use error::AuthError;
pub use jwt::{AccessClaims, JwtKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use ticketwave_core::signup::check_password;
use ticketwave_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{SocialProvider, UserRepository};
use crate::models::User;
use crate::services::identity::VerifiedIdentity;

/// Minimum display name length.
const MIN_NAME_LENGTH: usize = 2;

/// Authentication service.
///
/// Handles registration, login, email verification and provider logins.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt: &'a JwtKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new, unverified user with name, email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` if the name is too short.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(name, &email, &password_hash)
            .await
            .map_err(map_conflict)
    }

    /// Login with email and password.
    ///
    /// Accounts created through a provider have no password and always fail.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Email Verification
    // =========================================================================

    /// Mark the account named by a verification token as verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid, expired, or
    /// names an account that no longer exists.
    pub async fn verify_email(&self, token: &str) -> Result<UserId, AuthError> {
        let user_id = self.jwt.decode_verification(token)?;
        if self.users.mark_verified(user_id).await? {
            Ok(user_id)
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Look up an unverified account for a verification resend.
    ///
    /// Returns `None` for unknown addresses so callers can respond without
    /// revealing whether the account exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyVerified` if the account is already verified.
    pub async fn pending_verification(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        match self.users.get_by_email(&email).await? {
            Some(user) if user.email_verified => Err(AuthError::AlreadyVerified),
            other => Ok(other),
        }
    }

    // =========================================================================
    // Provider Logins
    // =========================================================================

    /// Find or create the account for a verified provider identity.
    ///
    /// New accounts are verified and have no password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn login_with_identity(
        &self,
        provider: SocialProvider,
        identity: &VerifiedIdentity,
        fallback_name: &str,
    ) -> Result<User, AuthError> {
        let name = identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback_name);

        let user = self
            .users
            .find_or_create_social(provider, &identity.subject, &identity.email, name)
            .await?;
        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn map_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

/// Validate a display name, returning it trimmed.
fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName("Name must be at least 2 characters"));
    }
    Ok(name)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    check_password(password).map_err(|message| AuthError::WeakPassword(message.to_string()))
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22a").expect("hashes");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22a", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter22b", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything1", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("abcdefg1").is_ok());
        assert!(matches!(
            validate_password("short1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("allletters").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("  Jo ").ok(), Some("Jo"));
        assert!(validate_name(" J ").is_err());
    }

    #[test]
    fn test_conflict_maps_to_already_exists() {
        assert!(matches!(
            map_conflict(RepositoryError::Conflict("email already exists".into())),
            AuthError::UserAlreadyExists
        ));
        assert!(matches!(
            map_conflict(RepositoryError::NotFound),
            AuthError::Repository(_)
        ));
    }
}
