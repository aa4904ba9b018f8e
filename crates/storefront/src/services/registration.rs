//! Account creation with a pass purchase.
//!
//! The signup wizard talks to registration through [`RegistrationApi`] so the
//! controller can run against an in-memory fake in tests.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use ticketwave_core::signup::{FieldErrors, RegistrationRequest};
use ticketwave_core::{Email, Merchandise, PaymentPlan, Price, UserId};

use super::auth::{AuthError, JwtKeys, hash_password};
use super::email::EmailService;
use crate::db::{RepositoryError, registrations};

/// Errors from a registration attempt.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The email is already registered.
    #[error("an account with this email already exists")]
    AlreadyRegistered,

    /// A registration for this email is already running.
    #[error("a registration for this email is already in progress")]
    InFlight,

    /// The request failed validation.
    #[error("invalid registration: {0}")]
    Invalid(FieldErrors),

    /// Password hashing or token signing failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),

    /// Registration backend could not be reached.
    #[error("registration unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for RegistrationError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::AlreadyRegistered,
            other => Self::Repository(other),
        }
    }
}

/// Result of a successful registration, shown on the success step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub plan: Option<PaymentPlan>,
    /// Amount charged today.
    pub charged: Option<Price>,
    pub merchandise: Vec<Merchandise>,
    /// Access token for the new account.
    pub token: String,
}

/// Creates accounts from completed signups.
pub trait RegistrationApi: Send + Sync {
    /// Register the account described by `request`.
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> impl Future<Output = Result<RegistrationReceipt, RegistrationError>> + Send;
}

/// Emails with a registration currently running.
///
/// Guards against double submission from the same or another tab.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistrations {
    emails: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistrations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `email`, or `None` if it is already claimed.
    ///
    /// The claim is released when the guard drops.
    #[must_use]
    pub fn try_begin(&self, email: &Email) -> Option<InFlightGuard> {
        let key = email.as_str().to_lowercase();
        let inserted = self
            .emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());

        inserted.then(|| InFlightGuard {
            emails: Arc::clone(&self.emails),
            key,
        })
    }
}

/// Releases an in-flight claim on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    emails: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Database-backed registration.
///
/// Writes the user, address, order and items in one transaction, then sends
/// the verification email. Email failures are logged, not returned.
pub struct RegistrationService<'a> {
    pool: &'a PgPool,
    jwt: &'a JwtKeys,
    email: &'a EmailService,
    in_flight: &'a InFlightRegistrations,
}

impl<'a> RegistrationService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        jwt: &'a JwtKeys,
        email: &'a EmailService,
        in_flight: &'a InFlightRegistrations,
    ) -> Self {
        Self {
            pool,
            jwt,
            email,
            in_flight,
        }
    }

    #[instrument(skip_all, fields(email = %request.email))]
    async fn create(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let _guard = self
            .in_flight
            .try_begin(&request.email)
            .ok_or(RegistrationError::InFlight)?;

        let password_hash = hash_password(request.password.expose_secret())?;

        let created = registrations::create(
            self.pool,
            registrations::NewRegistration {
                name: &request.name,
                email: &request.email,
                password_hash: &password_hash,
                address: request.address.as_ref(),
                plan: request.plan,
                merchandise: &request.merchandise,
            },
        )
        .await?;
        let user = created.user;

        info!(user_id = %user.id, order_id = ?created.order_id, "Registration complete");

        let verification = self.jwt.issue_verification(user.id)?;
        if let Err(e) = self
            .email
            .send_verification(&user.email, &user.name, &verification)
            .await
        {
            warn!(error = %e, user_id = %user.id, "Failed to send verification email");
        }

        let token = self.jwt.issue_access(&user)?;

        Ok(RegistrationReceipt {
            user_id: user.id,
            email: user.email,
            name: user.name,
            plan: request.plan,
            charged: request.plan.map(PaymentPlan::charge_today),
            merchandise: request.merchandise.clone(),
            token,
        })
    }
}

impl RegistrationApi for RegistrationService<'_> {
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> impl Future<Output = Result<RegistrationReceipt, RegistrationError>> + Send {
        self.create(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_claim_is_exclusive() {
        let in_flight = InFlightRegistrations::new();
        let email = Email::parse("jane@x.com").expect("valid");
        let shouting = Email::parse("JANE@x.com").expect("valid");

        let guard = in_flight.try_begin(&email);
        assert!(guard.is_some());
        assert!(in_flight.try_begin(&shouting).is_none());

        drop(guard);
        assert!(in_flight.try_begin(&email).is_some());
    }

    #[test]
    fn test_conflict_maps_to_already_registered() {
        let err = RegistrationError::from(RepositoryError::Conflict("email already exists".into()));
        assert!(matches!(err, RegistrationError::AlreadyRegistered));
    }

    #[test]
    fn test_receipt_wire_format() {
        let receipt = RegistrationReceipt {
            user_id: UserId::new(7),
            email: Email::parse("jane@x.com").expect("valid"),
            name: "Jane".to_string(),
            plan: Some(PaymentPlan::Installment),
            charged: Some(Price::usd(900)),
            merchandise: vec![Merchandise::Hoodie, Merchandise::Vinyl],
            token: "t".to_string(),
        };
        let json = serde_json::to_value(&receipt).expect("serializes");
        assert_eq!(json["userId"], 7);
        assert_eq!(json["plan"], "installment");
        assert_eq!(json["merchandise"][1], "vinyl");

        let back: RegistrationReceipt = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back, receipt);
    }
}
