//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::JwtKeys;
use crate::services::email::{EmailError, EmailService};
use crate::services::identity::IdentityVerifier;
use crate::services::registration::{InFlightRegistrations, RegistrationService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    jwt: JwtKeys,
    email: EmailService,
    identity: IdentityVerifier,
    in_flight: InFlightRegistrations,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the email service cannot be configured.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, EmailError> {
        let jwt = JwtKeys::new(&config.jwt);
        let email = EmailService::new(config.email.as_ref(), &config.base_url)?;
        let identity = IdentityVerifier::new(&config.identity);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                email,
                identity,
                in_flight: InFlightRegistrations::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Token signing keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Google and Apple token verification.
    #[must_use]
    pub fn identity(&self) -> &IdentityVerifier {
        &self.inner.identity
    }

    /// Registration service bound to this state.
    #[must_use]
    pub fn registrations(&self) -> RegistrationService<'_> {
        RegistrationService::new(
            &self.inner.pool,
            &self.inner.jwt,
            &self.inner.email,
            &self.inner.in_flight,
        )
    }
}
