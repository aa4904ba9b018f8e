//! The signup wizard state machine.
//!
//! ```text
//!            advance          advance          advance          submit
//!  [1] ─────────────▶ [2] ─────────────▶ [3] ─────────────▶ [4] ─────────▶ [5]
//!      ◀───────────── retreat ◀────────── retreat ◀────────
//! ```
//!
//! Every move forward is gated on the current step's validation. Landing on
//! steps 2 to 4 saves a draft when an email is known; landing on step 5
//! clears it. A fresh draft found at start-up is offered for resumption and
//! transitions wait until the offer is answered.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use ticketwave_core::signup::{
    CardDetails, FieldErrors, FormData, RegistrationRequest, WizardDraft, WizardStep, fields,
    validate_step,
};

use super::store::{DraftSlot, DraftStore};
use crate::services::registration::{RegistrationApi, RegistrationError, RegistrationReceipt};

/// Shown when the visitor leaves with progress on a persistable step.
pub const UNSAVED_PROGRESS_WARNING: &str =
    "You have unsaved progress. If you leave now, your registration may not be completed.";

/// Fields never kept in the wizard's form data.
const CARD_FIELDS: [&str; 3] = [fields::CARD_NUMBER, fields::CARD_EXPIRY, fields::CARD_CVC];

/// Fields never echoed back to clients.
const SECRET_FIELDS: [&str; 2] = [fields::PASSWORD, fields::CONFIRM_PASSWORD];

/// Rejected wizard operations.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A saved signup was found and the visitor has not chosen yet.
    #[error("Choose whether to resume your saved registration first")]
    ResumePending,

    /// Resume was requested but nothing is on offer.
    #[error("There is no saved registration to resume")]
    NoResumeOffer,

    /// The offered draft went stale before the visitor accepted it.
    #[error("Your saved registration has expired")]
    ResumeExpired,

    /// The wizard already reached the success step.
    #[error("Signup is already complete")]
    Terminal,

    /// The payment step moves forward only by submitting payment.
    #[error("Submit your payment details to continue")]
    PaymentRequired,

    /// Payment was submitted outside the payment step.
    #[error("Payment can only be submitted on the payment step")]
    NotOnPayment,

    /// The current step's input is invalid.
    #[error("Please correct the highlighted fields")]
    Validation(FieldErrors),

    /// The registration call failed; the wizard stays on payment.
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),
}

/// Result of a last-chance save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushOutcome {
    /// Whether a draft was written before the deadline.
    pub saved: bool,
    /// Warning to show the visitor, if they have progress at stake.
    pub warning: Option<&'static str>,
}

/// A saved signup awaiting the visitor's resume/start-fresh choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeOffer {
    pub email: String,
    pub step: WizardStep,
    pub last_updated: DateTime<Utc>,
}

impl From<&WizardDraft> for ResumeOffer {
    fn from(draft: &WizardDraft) -> Self {
        Self {
            email: draft.email.clone(),
            step: draft.current_step,
            last_updated: draft.last_updated,
        }
    }
}

/// What clients render for the current wizard state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub current_step: WizardStep,
    pub step_name: &'static str,
    pub total_steps: u8,
    /// Collected answers, without password fields.
    pub form_data: FormData,
    pub resume_offer: Option<ResumeOffer>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub receipt: Option<RegistrationReceipt>,
}

/// Signup wizard controller.
///
/// Holds the current step and collected answers for one visitor. The state
/// is serializable so it can live in the visitor's session between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupWizard {
    current_step: WizardStep,
    form_data: FormData,
    pending_resume: Option<WizardDraft>,
    receipt: Option<RegistrationReceipt>,
}

impl SignupWizard {
    /// A wizard on step 1 with no answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_step(&self) -> WizardStep {
        self.current_step
    }

    #[must_use]
    pub const fn form_data(&self) -> &FormData {
        &self.form_data
    }

    /// The draft on offer, if the visitor has not answered yet.
    #[must_use]
    pub const fn pending_resume(&self) -> Option<&WizardDraft> {
        self.pending_resume.as_ref()
    }

    /// Outcome of a completed registration.
    #[must_use]
    pub const fn receipt(&self) -> Option<&RegistrationReceipt> {
        self.receipt.as_ref()
    }

    /// Start the wizard, checking the store for a draft to offer.
    pub async fn initialize<S: DraftSlot>(&mut self, store: &DraftStore<S>) -> Option<ResumeOffer> {
        self.initialize_at(store, Utc::now()).await
    }

    /// Start the wizard as of `now`.
    ///
    /// Resets to step 1. A fresh draft becomes a pending resume offer; stale
    /// or unreadable drafts are cleared by the store and ignored.
    pub async fn initialize_at<S: DraftSlot>(
        &mut self,
        store: &DraftStore<S>,
        now: DateTime<Utc>,
    ) -> Option<ResumeOffer> {
        *self = Self::new();

        self.pending_resume = match store.load_at(None, now).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Failed to load signup draft");
                None
            }
        };

        self.pending_resume.as_ref().map(ResumeOffer::from)
    }

    /// Accept the resume offer.
    ///
    /// Moves to the draft's step and merges its answers over the current ones.
    /// Returns the step resumed at.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NoResumeOffer` if nothing is on offer, or
    /// `WizardError::ResumeExpired` if the offer went stale meanwhile.
    pub async fn resume<S: DraftSlot>(
        &mut self,
        store: &DraftStore<S>,
    ) -> Result<WizardStep, WizardError> {
        self.resume_at(store, Utc::now()).await
    }

    /// Accept the resume offer as of `now`.
    ///
    /// A stale offer is withdrawn and its draft cleared; the wizard stays on
    /// step 1.
    ///
    /// # Errors
    ///
    /// See [`Self::resume`].
    pub async fn resume_at<S: DraftSlot>(
        &mut self,
        store: &DraftStore<S>,
        now: DateTime<Utc>,
    ) -> Result<WizardStep, WizardError> {
        let draft = self.pending_resume.take().ok_or(WizardError::NoResumeOffer)?;

        if draft.is_stale_at(now) || !draft.current_step.is_persistable() {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Failed to clear expired signup draft");
            }
            return Err(WizardError::ResumeExpired);
        }

        self.current_step = draft.current_step;
        self.form_data.merge(draft.form_data);
        strip(&mut self.form_data, &CARD_FIELDS);

        info!(step = %self.current_step, "Resumed signup draft");
        Ok(self.current_step)
    }

    /// Decline the offer or restart: clear the draft and go back to step 1.
    pub async fn start_fresh<S: DraftSlot>(&mut self, store: &DraftStore<S>) {
        *self = Self::new();
        if let Err(e) = store.clear().await {
            warn!(error = %e, "Failed to clear signup draft");
        }
    }

    /// Shallow-merge answers into the form. Card fields are dropped.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::ResumePending` or `WizardError::Terminal`.
    pub fn update_form_data(&mut self, mut partial: FormData) -> Result<(), WizardError> {
        self.ensure_free()?;
        strip(&mut partial, &CARD_FIELDS);
        self.form_data.merge(partial);
        Ok(())
    }

    /// Validate the current step and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` with the offending fields, or the
    /// reason the wizard cannot move forward from here.
    pub async fn advance<S: DraftSlot>(
        &mut self,
        store: &DraftStore<S>,
    ) -> Result<WizardStep, WizardError> {
        self.ensure_free()?;
        if self.current_step == WizardStep::Payment {
            return Err(WizardError::PaymentRequired);
        }

        validate_step(self.current_step, &self.form_data).map_err(WizardError::Validation)?;

        self.enter(store, self.current_step.next()).await;
        Ok(self.current_step)
    }

    /// Go back one step. Never touches the store.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::ResumePending` or `WizardError::Terminal`.
    pub fn retreat(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_free()?;
        self.current_step = self.current_step.previous();
        Ok(self.current_step)
    }

    /// Best-effort save before the visitor leaves, bounded by `timeout`.
    pub async fn flush<S: DraftSlot>(&self, store: &DraftStore<S>, timeout: Duration) -> FlushOutcome {
        let Some(email) = self.persistable_email() else {
            return FlushOutcome {
                saved: false,
                warning: None,
            };
        };

        let saved =
            match tokio::time::timeout(timeout, store.save(email, self.current_step, &self.form_data))
                .await
            {
                Ok(Ok(saved)) => saved,
                Ok(Err(e)) => {
                    warn!(error = %e, "Last-chance draft save failed");
                    false
                }
                Err(_) => {
                    warn!(?timeout, "Last-chance draft save timed out");
                    false
                }
            };

        FlushOutcome {
            saved,
            warning: Some(UNSAVED_PROGRESS_WARNING),
        }
    }

    /// Submit payment and register.
    ///
    /// On success the receipt is kept, password fields are dropped from the
    /// form and the wizard moves to the success step, clearing the draft. On
    /// failure the wizard stays on payment with its draft in place so the
    /// visitor can retry.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Validation` for bad card or form data and
    /// `WizardError::Registration` if the registration call fails.
    pub async fn submit<S: DraftSlot, R: RegistrationApi>(
        &mut self,
        store: &DraftStore<S>,
        registrar: &R,
        card: &CardDetails,
    ) -> Result<&RegistrationReceipt, WizardError> {
        self.ensure_free()?;
        if self.current_step != WizardStep::Payment {
            return Err(WizardError::NotOnPayment);
        }

        card.validate().map_err(WizardError::Validation)?;
        let request =
            RegistrationRequest::from_form(&self.form_data).map_err(WizardError::Validation)?;

        let receipt = match registrar.register(&request).await {
            Ok(receipt) => receipt,
            Err(e @ (RegistrationError::InFlight | RegistrationError::AlreadyRegistered)) => {
                // Another submission owns this email; its outcome decides the draft.
                warn!(error = %e, "Registration rejected as duplicate");
                return Err(e.into());
            }
            Err(e) => {
                warn!(error = %e, "Registration failed, staying on payment");
                self.save_draft(store).await;
                return Err(e.into());
            }
        };

        debug!(card = ?card, "Payment accepted");
        strip(&mut self.form_data, &SECRET_FIELDS);
        self.enter(store, WizardStep::Success).await;

        Ok(self.receipt.insert(receipt))
    }

    /// Client-facing view of the current state.
    #[must_use]
    pub fn view(&self) -> WizardView {
        let mut form_data = self.form_data.clone();
        strip(&mut form_data, &SECRET_FIELDS);

        let free = self.pending_resume.is_none() && !self.current_step.is_terminal();
        WizardView {
            current_step: self.current_step,
            step_name: self.current_step.name(),
            total_steps: WizardStep::LAST.number(),
            form_data,
            resume_offer: self.pending_resume.as_ref().map(ResumeOffer::from),
            can_advance: free && self.current_step != WizardStep::Payment,
            can_retreat: free && self.current_step != WizardStep::FIRST,
            receipt: self.receipt.clone(),
        }
    }

    fn ensure_free(&self) -> Result<(), WizardError> {
        if self.pending_resume.is_some() {
            return Err(WizardError::ResumePending);
        }
        if self.current_step.is_terminal() {
            return Err(WizardError::Terminal);
        }
        Ok(())
    }

    fn persistable_email(&self) -> Option<&str> {
        self.current_step
            .is_persistable()
            .then(|| self.form_data.email())
            .flatten()
    }

    async fn enter<S: DraftSlot>(&mut self, store: &DraftStore<S>, step: WizardStep) {
        self.current_step = step;
        debug!(%step, "Entered signup step");

        if step.is_terminal() {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Failed to clear signup draft");
            }
        } else {
            self.save_draft(store).await;
        }
    }

    async fn save_draft<S: DraftSlot>(&self, store: &DraftStore<S>) {
        let Some(email) = self.persistable_email() else {
            return;
        };
        if let Err(e) = store.save(email, self.current_step, &self.form_data).await {
            warn!(error = %e, "Failed to save signup draft");
        }
    }
}

fn strip(form: &mut FormData, keys: &[&str]) {
    for key in keys {
        form.remove(key);
    }
}
