//! Per-step validation.
//!
//! Every step produces a [`StepResult`]. The wizard controller refuses to
//! persist or transition on an `Err`, so invalid data never reaches the
//! draft store or the registration API.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FormData, WizardStep, fields};
use crate::types::{Email, MERCHANDISE_PICKS, Merchandise, PaymentPlan};

/// Minimum trimmed length of the account holder's name.
const MIN_NAME_LEN: usize = 2;

/// Minimum password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Field name to human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding a single error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error for `field`. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Absorb every error from `other`.
    pub fn extend(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> StepResult {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Outcome of validating one step.
pub type StepResult = Result<(), FieldErrors>;

/// Validate the fields owned by `step`.
///
/// The payment step owns card fields which are never part of [`FormData`];
/// they are checked by [`CardDetails::validate`](super::CardDetails::validate)
/// at submission time, so this returns `Ok` for [`WizardStep::Payment`].
///
/// # Errors
///
/// Returns the failing fields, or an error on `_step` for the terminal step
/// which has no transition out.
pub fn validate_step(step: WizardStep, form: &FormData) -> StepResult {
    match step {
        WizardStep::TicketOptions => validate_ticket_options(form),
        WizardStep::PassDetails => validate_pass_details(form),
        WizardStep::UserInfo => validate_user_info(form),
        WizardStep::Payment => Ok(()),
        WizardStep::Success => Err(FieldErrors::single(
            "_step",
            "Signup is already complete",
        )),
    }
}

fn validate_ticket_options(form: &FormData) -> StepResult {
    match form.get_str(fields::PAYMENT_OPTION) {
        Some(option) if option.parse::<PaymentPlan>().is_ok() => Ok(()),
        _ => Err(FieldErrors::single(
            fields::PAYMENT_OPTION,
            "Please choose a payment option",
        )),
    }
}

fn validate_pass_details(form: &FormData) -> StepResult {
    let mut errors = FieldErrors::new();

    if let Err(message) = parse_merchandise(form.get(fields::MERCHANDISE)) {
        errors.add(fields::MERCHANDISE, message);
    }

    if form.get_bool(fields::TERMS_ACCEPTED) != Some(true) {
        errors.add(fields::TERMS_ACCEPTED, "You must accept the pass terms");
    }

    errors.into_result()
}

/// Parse the merchandise selection: exactly two distinct known item ids.
pub(super) fn parse_merchandise(value: Option<&Value>) -> Result<Vec<Merchandise>, String> {
    let wrong_count = || format!("Please select exactly {MERCHANDISE_PICKS} items");

    let Some(Value::Array(ids)) = value else {
        return Err(wrong_count());
    };

    let mut picked = BTreeSet::new();
    for id in ids {
        let item = id
            .as_str()
            .and_then(Merchandise::from_id)
            .ok_or_else(|| "Unknown merchandise item".to_string())?;
        picked.insert(item);
    }

    if picked.len() != MERCHANDISE_PICKS || ids.len() != MERCHANDISE_PICKS {
        return Err(wrong_count());
    }

    Ok(picked.into_iter().collect())
}

fn validate_user_info(form: &FormData) -> StepResult {
    let mut errors = FieldErrors::new();

    let name = form.get_str(fields::NAME).map_or("", str::trim);
    if name.chars().count() < MIN_NAME_LEN {
        errors.add(fields::NAME, "Name must be at least 2 characters");
    }

    match form.email() {
        None => errors.add(fields::EMAIL, "Email is required"),
        Some(email) => {
            if Email::parse(email).is_err() {
                errors.add(fields::EMAIL, "Please enter a valid email address");
            }
        }
    }

    let password = form.get_str(fields::PASSWORD).unwrap_or_default();
    if let Err(message) = check_password(password) {
        errors.add(fields::PASSWORD, message);
    }

    if form.get_str(fields::CONFIRM_PASSWORD) != Some(password) {
        errors.add(fields::CONFIRM_PASSWORD, "Passwords do not match");
    }

    for (field, label) in [
        (fields::ADDRESS, "Address"),
        (fields::CITY, "City"),
        (fields::STATE, "State"),
        (fields::ZIP_CODE, "ZIP code"),
    ] {
        if form.get_str(field).is_none_or(|v| v.trim().is_empty()) {
            errors.add(field, format!("{label} is required"));
        }
    }

    errors.into_result()
}

/// Password complexity: minimum length, at least one letter and one digit.
///
/// # Errors
///
/// Returns a user-facing message describing the first unmet rule.
pub fn check_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err("Password must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number");
    }
    Ok(())
}
