//! Authentication API.
//!
//! Password signup and login, email verification, Google and Apple token
//! exchange, and full pass registration. Successful logins return a bearer
//! access token plus where the web app should send the user next.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ticketwave_core::signup::{FormData, RegistrationRequest};

use crate::db::users::SocialProvider;
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::{User, UserView};
use crate::services::auth::AuthService;
use crate::services::registration::{RegistrationApi, RegistrationReceipt};
use crate::state::AppState;

/// Display name for Apple accounts that share no name.
const APPLE_DEFAULT_NAME: &str = "Apple User";

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Provider token exchange. `name` is only sent by Apple, on first sign-in.
#[derive(Debug, Deserialize)]
pub struct ProviderTokenRequest {
    pub token: String,
    pub name: Option<String>,
}

/// Body of every message-only response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
    pub redirect_to: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailResponse {
    pub message: &'static str,
    pub redirect_to: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub registration: RegistrationReceipt,
}

fn login_response(state: &AppState, user: &User, redirect_to: &'static str) -> Result<LoginResponse> {
    let token = state.jwt().issue_access(user)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(LoginResponse {
        token,
        user: UserView::from(user),
        redirect_to,
    })
}

/// Send a fresh verification link, logging instead of failing.
async fn send_verification_quietly(state: &AppState, user: &User) {
    let result = match state.jwt().issue_verification(user.id) {
        Ok(token) => state
            .email()
            .send_verification(&user.email, &user.name, &token)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(error) = result {
        warn!(%error, user_id = %user.id, "Failed to send verification email");
    }
}

// =============================================================================
// Password Accounts
// =============================================================================

/// Create an unverified password account.
///
/// POST /api/auth/signup
///
/// # Errors
///
/// Returns 400 for invalid input and 409 if the email is taken.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let auth = AuthService::new(state.pool(), state.jwt());
    let user = auth
        .register_with_password(&req.name, &req.email, &req.password)
        .await?;

    info!(user_id = %user.id, "User signed up");
    send_verification_quietly(&state, &user).await;

    let token = state.jwt().issue_access(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully. Please verify your email.",
            token,
            user: UserView::from(&user),
        }),
    ))
}

/// Log in with email and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 "Invalid credentials" for any unknown email or wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    let user = auth.login_with_password(&req.email, &req.password).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(login_response(&state, &user, user.login_redirect())?))
}

// =============================================================================
// Email Verification
// =============================================================================

/// Follow a verification link.
///
/// GET /api/auth/verify-email?token=...
///
/// # Errors
///
/// Returns 400 if the token is missing, invalid or expired.
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<VerifyEmailResponse>> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Invalid token".to_string()))?;

    let auth = AuthService::new(state.pool(), state.jwt());
    let user_id = auth.verify_email(&token).await?;

    info!(%user_id, "Email verified");
    Ok(Json(VerifyEmailResponse {
        message: "Email verified successfully",
        redirect_to: "/tickets",
    }))
}

/// Send another verification link.
///
/// POST /api/auth/resend-verification
///
/// Unknown addresses get the same 200 as known ones.
///
/// # Errors
///
/// Returns 400 if the account is already verified and 500 if the email
/// cannot be sent.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.jwt());

    let Some(user) = auth.pending_verification(&req.email).await? else {
        return Ok(Json(MessageResponse {
            message: "If your email exists in our system, a verification link has been sent",
        }));
    };

    let token = state.jwt().issue_verification(user.id)?;
    state
        .email()
        .send_verification(&user.email, &user.name, &token)
        .await?;

    Ok(Json(MessageResponse {
        message: "Verification email sent successfully",
    }))
}

// =============================================================================
// Provider Logins
// =============================================================================

/// Exchange a Google ID token.
///
/// POST /api/auth/google
///
/// # Errors
///
/// Returns 401 if Google rejects the token.
pub async fn google(
    State(state): State<AppState>,
    Json(req): Json<ProviderTokenRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = state.identity().verify_google(&req.token).await?;

    let auth = AuthService::new(state.pool(), state.jwt());
    let fallback_name = identity.email.local_part().to_string();
    let user = auth
        .login_with_identity(SocialProvider::Google, &identity, &fallback_name)
        .await?;

    info!(user_id = %user.id, "Google login");
    Ok(Json(login_response(&state, &user, user.social_redirect())?))
}

/// Exchange an Apple identity token.
///
/// POST /api/auth/apple
///
/// # Errors
///
/// Returns 401 if the token fails verification against Apple's keys.
pub async fn apple(
    State(state): State<AppState>,
    Json(req): Json<ProviderTokenRequest>,
) -> Result<Json<LoginResponse>> {
    let mut identity = state.identity().verify_apple(&req.token).await?;
    identity.name = req.name;

    let auth = AuthService::new(state.pool(), state.jwt());
    let user = auth
        .login_with_identity(SocialProvider::Apple, &identity, APPLE_DEFAULT_NAME)
        .await?;

    info!(user_id = %user.id, "Apple login");
    Ok(Json(login_response(&state, &user, user.social_redirect())?))
}

// =============================================================================
// Current User & Registration
// =============================================================================

/// The authenticated user.
///
/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 without a valid token and 404 if the account is gone.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<MeResponse>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    let user = auth.get_user(current.id).await?;
    Ok(Json(MeResponse {
        user: UserView::from(&user),
    }))
}

/// Register an account with a pass order in one call.
///
/// POST /api/auth/register
///
/// Takes the same fields the signup wizard collects.
///
/// # Errors
///
/// Returns 400 with field errors for incomplete input and 409 for a taken
/// or in-flight email.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<FormData>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let request = RegistrationRequest::from_form(&form).map_err(AppError::Validation)?;
    let registration = state.registrations().register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please verify your email.",
            registration,
        }),
    ))
}
