//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses are JSON: `{"message": ..., "errors": ...}`,
//! where `errors` maps form fields to messages for validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use ticketwave_core::signup::FieldErrors;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::identity::IdentityError;
use crate::services::registration::RegistrationError;
use crate::signup::{DraftStoreError, WizardError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Google or Apple token verification failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Account creation failed.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Signup wizard rejected the operation.
    #[error("Signup error: {0}")]
    Wizard(#[from] WizardError),

    /// Outgoing email failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Draft slot could not be read or written.
    #[error("Draft error: {0}")]
    Draft(#[from] DraftStoreError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Request body failed field validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

const INTERNAL: &str = "Internal server error";

fn auth_parts(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidEmail(_) => (
            StatusCode::BAD_REQUEST,
            "Please enter a valid email address".to_string(),
        ),
        AuthError::InvalidName(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            "User with this email already exists".to_string(),
        ),
        AuthError::InvalidToken => (
            StatusCode::BAD_REQUEST,
            "Invalid or expired verification token".to_string(),
        ),
        AuthError::AlreadyVerified => (
            StatusCode::BAD_REQUEST,
            "Email is already verified".to_string(),
        ),
        AuthError::TokenSigning(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
        }
    }
}

fn registration_parts(err: &RegistrationError) -> (StatusCode, String, Option<&FieldErrors>) {
    match err {
        RegistrationError::AlreadyRegistered => (
            StatusCode::CONFLICT,
            "User with this email already exists".to_string(),
            None,
        ),
        RegistrationError::InFlight => (
            StatusCode::CONFLICT,
            "A registration for this email is already in progress".to_string(),
            None,
        ),
        RegistrationError::Invalid(errors) => (
            StatusCode::BAD_REQUEST,
            "Please correct the highlighted fields".to_string(),
            Some(errors),
        ),
        RegistrationError::Auth(e) => {
            let (status, message) = auth_parts(e);
            (status, message, None)
        }
        RegistrationError::Repository(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None)
        }
        RegistrationError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Registration is temporarily unavailable, please try again".to_string(),
            None,
        ),
    }
}

fn wizard_parts(err: &WizardError) -> (StatusCode, String, Option<&FieldErrors>) {
    match err {
        WizardError::Validation(errors) => (StatusCode::BAD_REQUEST, err.to_string(), Some(errors)),
        WizardError::PaymentRequired => (StatusCode::BAD_REQUEST, err.to_string(), None),
        WizardError::ResumePending
        | WizardError::NoResumeOffer
        | WizardError::Terminal
        | WizardError::NotOnPayment
        | WizardError::ResumeExpired => (StatusCode::CONFLICT, err.to_string(), None),
        WizardError::Registration(e) => registration_parts(e),
    }
}

fn identity_parts(err: &IdentityError) -> (StatusCode, String) {
    match err {
        IdentityError::Http(_) => (
            StatusCode::BAD_GATEWAY,
            "Identity provider unavailable".to_string(),
        ),
        IdentityError::Rejected(_)
        | IdentityError::Jwt(_)
        | IdentityError::UnknownKey
        | IdentityError::Email(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
    }
}

impl AppError {
    /// Status, client-safe message and field errors.
    fn parts(&self) -> (StatusCode, String, Option<&FieldErrors>) {
        match self {
            Self::Database(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string(), None)
            }
            Self::Database(RepositoryError::Conflict(_)) => (
                StatusCode::CONFLICT,
                "Resource already exists".to_string(),
                None,
            ),
            Self::Database(_)
            | Self::Email(_)
            | Self::Draft(_)
            | Self::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None),
            Self::Auth(e) => {
                let (status, message) = auth_parts(e);
                (status, message, None)
            }
            Self::Identity(e) => {
                let (status, message) = identity_parts(e);
                (status, message, None)
            }
            Self::Registration(e) => registration_parts(e),
            Self::Wizard(e) => wizard_parts(e),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Please correct the highlighted fields".to_string(),
                Some(errors),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(ErrorBody { message, errors })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("signup", "Advanced wizard", Some(&[("step", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
