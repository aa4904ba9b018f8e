//! Account support commands.
//!
//! # Usage
//!
//! ```bash
//! # Verify an email when the fan never received the link
//! tw-cli user verify --email fan@example.com
//! ```

use thiserror::Error;

use ticketwave_core::{Email, UserId};
use ticketwave_storefront::db::RepositoryError;
use ticketwave_storefront::db::users::UserRepository;

use super::{CommandError, connect};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No user with email: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Mark the account's email as verified.
///
/// # Returns
///
/// The ID of the verified account.
///
/// # Errors
///
/// Returns `UserError::NotFound` if no account uses this email.
pub async fn verify_email(email: &str) -> Result<UserId, UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .mark_verified_by_email(&email)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!("Email verified! ID: {}, Email: {}", user.id, user.email);
    Ok(user.id)
}
