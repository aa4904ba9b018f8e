//! Signup wizard model.
//!
//! The FANS ONLY pass signup is a fixed five-step wizard:
//!
//! ```text
//! 1 TicketOptions -> 2 PassDetails -> 3 UserInfo -> 4 Payment -> 5 Success
//! ```
//!
//! This module holds the pure parts of the wizard: the step enumeration, the
//! accumulated [`FormData`], the persisted [`WizardDraft`] snapshot with its
//! staleness rule, and per-step validation producing a [`StepResult`].
//! Persistence and transitions live in the storefront's controller.

mod card;
mod draft;
mod form;
mod request;
mod step;
mod validate;

pub use card::CardDetails;
pub use draft::{DRAFT_TTL_HOURS, WizardDraft};
pub use form::FormData;
pub use request::RegistrationRequest;
pub use step::{InvalidStep, WizardStep};
pub use validate::{FieldErrors, StepResult, check_password, validate_step};

/// Form field names as sent by the signup views.
pub mod fields {
    pub const PAYMENT_OPTION: &str = "paymentOption";
    pub const MERCHANDISE: &str = "merchandise";
    pub const TERMS_ACCEPTED: &str = "termsAccepted";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const CONFIRM_PASSWORD: &str = "confirmPassword";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP_CODE: &str = "zipCode";
    pub const CARD_NUMBER: &str = "cardNumber";
    pub const CARD_EXPIRY: &str = "cardExpiry";
    pub const CARD_CVC: &str = "cardCvc";
}
