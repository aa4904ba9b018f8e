//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database ping)
//! GET  /api/health                      - API status
//!
//! # Signup wizard (session-scoped)
//! GET   /api/signup                     - Mount wizard (page load), with any resume offer
//! GET   /api/signup/draft               - Saved draft summary
//! POST  /api/signup/resume              - Accept resume offer
//! POST  /api/signup/start-fresh         - Decline offer / restart
//! PATCH /api/signup/form                - Merge answers
//! POST  /api/signup/advance             - Validate and move forward
//! POST  /api/signup/retreat             - Move back
//! POST  /api/signup/flush               - Last-chance save on unload
//! POST  /api/signup/submit              - Pay and register
//!
//! # Auth
//! POST /api/auth/signup                 - Password signup
//! POST /api/auth/login                  - Password login
//! GET  /api/auth/verify-email           - Follow verification link
//! POST /api/auth/resend-verification    - Resend verification link
//! POST /api/auth/google                 - Google token exchange
//! POST /api/auth/apple                  - Apple token exchange
//! GET  /api/auth/me                     - Current user (Bearer)
//! POST /api/auth/register               - Account + pass order in one call
//!
//! # Profile (Bearer)
//! GET  /api/users/me                    - Dashboard profile
//! PUT  /api/users/me                    - Update name / address
//! PUT  /api/users/payment               - Replace card on file
//! ```

pub mod auth;
pub mod health;
pub mod signup;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

/// Create the signup wizard routes router.
pub fn signup_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(signup::show))
        .route("/draft", get(signup::draft))
        .route("/resume", post(signup::resume))
        .route("/start-fresh", post(signup::start_fresh))
        .route("/form", patch(signup::update_form))
        .route("/advance", post(signup::advance))
        .route("/retreat", post(signup::retreat))
        .route("/flush", post(signup::flush))
        .route("/submit", post(signup::submit))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/verify-email", get(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/google", post(auth::google))
        .route("/apple", post(auth::apple))
        .route("/me", get(auth::me))
        .route("/register", post(auth::register))
}

/// Create the profile routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me).put(users::update_me))
        .route("/payment", put(users::update_payment))
}

/// Routes without rate limiting or session state.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/health", get(health::api_health))
}
