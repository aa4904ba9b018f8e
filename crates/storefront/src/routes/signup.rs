//! Signup wizard API.
//!
//! Each visitor's wizard lives in their session under
//! `session_keys::SIGNUP_WIZARD`; its draft slot lives beside it under
//! `session_keys::SIGNUP_DRAFT`. Handlers load the wizard, apply one
//! operation and store it back.

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;

use ticketwave_core::signup::{CardDetails, FormData};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::signup::{DraftStore, FlushOutcome, ResumeOffer, SessionSlot, SignupWizard, WizardView};
use crate::state::AppState;

/// Deadline for the last-chance save sent as the page unloads.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

fn draft_store(session: &Session) -> DraftStore<SessionSlot> {
    DraftStore::new(SessionSlot::new(session.clone()))
}

/// The session's wizard, mounting a new one if the page never loaded it.
async fn load_wizard(session: &Session, store: &DraftStore<SessionSlot>) -> Result<SignupWizard> {
    if let Some(wizard) = session
        .get::<SignupWizard>(session_keys::SIGNUP_WIZARD)
        .await?
    {
        return Ok(wizard);
    }

    let mut wizard = SignupWizard::new();
    wizard.initialize(store).await;
    Ok(wizard)
}

async fn save_wizard(session: &Session, wizard: &SignupWizard) -> Result<()> {
    session.insert(session_keys::SIGNUP_WIZARD, wizard).await?;
    Ok(())
}

/// Mount the wizard for a page load.
///
/// GET /api/signup
///
/// Starts a new wizard at step 1. If the session holds a fresh draft it is
/// included as `resumeOffer`; other operations return the updated view and
/// do not need this call.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn show(session: Session) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = SignupWizard::new();
    wizard.initialize(&store).await;
    save_wizard(&session, &wizard).await?;
    Ok(Json(wizard.view()))
}

/// Saved draft summary for a "continue your signup" prompt.
///
/// GET /api/signup/draft
///
/// # Errors
///
/// Returns `AppError::NotFound` when there is no fresh draft.
pub async fn draft(session: Session) -> Result<Json<ResumeOffer>> {
    draft_store(&session)
        .load()
        .await?
        .map(|draft| Json(ResumeOffer::from(&draft)))
        .ok_or_else(|| AppError::NotFound("No saved registration".to_string()))
}

/// Accept the resume offer.
///
/// POST /api/signup/resume
///
/// # Errors
///
/// Returns `WizardError::NoResumeOffer` (409) if nothing is on offer, or
/// `WizardError::ResumeExpired` (409) if the draft went stale meanwhile.
pub async fn resume(session: Session) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    let resumed = wizard.resume(&store).await;
    save_wizard(&session, &wizard).await?;
    let step = resumed?;

    let step = step.to_string();
    add_breadcrumb("signup", "Resumed draft", Some(&[("step", step.as_str())]));
    Ok(Json(wizard.view()))
}

/// Decline the resume offer or restart the signup.
///
/// POST /api/signup/start-fresh
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn start_fresh(session: Session) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    wizard.start_fresh(&store).await;
    save_wizard(&session, &wizard).await?;

    add_breadcrumb("signup", "Started fresh", None);
    Ok(Json(wizard.view()))
}

/// Merge answers into the form.
///
/// PATCH /api/signup/form
///
/// # Errors
///
/// Returns 409 while a resume offer is pending or after success, or
/// `AppError::Session` if the session store fails.
pub async fn update_form(
    session: Session,
    Json(partial): Json<FormData>,
) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    wizard.update_form_data(partial)?;
    save_wizard(&session, &wizard).await?;

    Ok(Json(wizard.view()))
}

/// Validate the current step and move forward.
///
/// POST /api/signup/advance
///
/// # Errors
///
/// Returns 400 with field errors if the step is incomplete, or 409 if the
/// wizard cannot advance from its current state.
pub async fn advance(session: Session) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    let step = wizard.advance(&store).await?;
    save_wizard(&session, &wizard).await?;

    let step = step.to_string();
    add_breadcrumb("signup", "Advanced", Some(&[("step", step.as_str())]));
    Ok(Json(wizard.view()))
}

/// Go back one step.
///
/// POST /api/signup/retreat
///
/// # Errors
///
/// Returns 409 while a resume offer is pending or after completion.
pub async fn retreat(session: Session) -> Result<Json<WizardView>> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    wizard.retreat()?;
    save_wizard(&session, &wizard).await?;

    Ok(Json(wizard.view()))
}

/// Last-chance save, sent as a beacon when the page unloads.
///
/// POST /api/signup/flush
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn flush(session: Session) -> Result<Json<FlushOutcome>> {
    let store = draft_store(&session);
    let wizard = load_wizard(&session, &store).await?;
    Ok(Json(wizard.flush(&store, FLUSH_TIMEOUT).await))
}

/// Submit payment and register.
///
/// POST /api/signup/submit
///
/// Card details travel only in this request body; they are validated and
/// dropped, never stored.
///
/// # Errors
///
/// Returns 400 for invalid card or form fields, 409 for a duplicate or
/// in-flight registration. The wizard stays on payment after any failure.
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(card): Json<CardDetails>,
) -> Result<(StatusCode, Json<WizardView>)> {
    let store = draft_store(&session);
    let mut wizard = load_wizard(&session, &store).await?;

    let registrar = state.registrations();
    let user_id = wizard
        .submit(&store, &registrar, &card)
        .await?
        .user_id
        .to_string();
    save_wizard(&session, &wizard).await?;

    add_breadcrumb(
        "signup",
        "Completed registration",
        Some(&[("user_id", user_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(wizard.view())))
}
