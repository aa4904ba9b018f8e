//! Signup wizard runtime: draft persistence and the step controller.
//!
//! The pure model (steps, form data, validation) lives in
//! [`ticketwave_core::signup`]. This module adds the parts that touch
//! storage and the registration backend.

mod controller;
mod store;

pub use controller::{
    FlushOutcome, ResumeOffer, SignupWizard, UNSAVED_PROGRESS_WARNING, WizardError, WizardView,
};
pub use store::{DraftSlot, DraftStore, DraftStoreError, MemorySlot, SessionSlot};
