//! Card fields captured on the payment step.

use std::fmt;

use serde::Deserialize;

use super::{FieldErrors, StepResult, fields};

/// Card input for the payment step.
///
/// Only ever held for the duration of a submission; it is never merged into
/// form data, so it cannot reach the draft store.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_number: String,
    pub card_expiry: String,
    pub card_cvc: String,
}

impl CardDetails {
    /// Card number with spaces removed.
    #[must_use]
    pub fn digits(&self) -> String {
        self.card_number.chars().filter(|c| *c != ' ').collect()
    }

    /// Last four digits of the card number, if it has at least four.
    #[must_use]
    pub fn last4(&self) -> Option<String> {
        let digits = self.digits();
        let start = digits.len().checked_sub(4)?;
        digits.get(start..).map(str::to_string)
    }

    /// Check the card is well-formed.
    ///
    /// # Errors
    ///
    /// Returns one entry per malformed card field.
    pub fn validate(&self) -> StepResult {
        let mut errors = FieldErrors::new();

        let digits = self.digits();
        if !(16..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            errors.add(fields::CARD_NUMBER, "Please enter a valid card number");
        }

        if !is_valid_expiry(self.card_expiry.trim()) {
            errors.add(fields::CARD_EXPIRY, "Expiry must be in MM/YY format");
        }

        let cvc = self.card_cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            errors.add(fields::CARD_CVC, "Please enter a valid CVC");
        }

        errors.into_result()
    }
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return false;
    }
    month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("card_expiry", &"[REDACTED]")
            .field("card_cvc", &"[REDACTED]")
            .finish()
    }
}
