//! Wizard step enumeration.

use serde::{Deserialize, Serialize};

/// Error returned when a number does not name a wizard step.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("wizard step must be between 1 and 5 (got {0})")]
pub struct InvalidStep(pub u8);

/// One step of the signup wizard.
///
/// Steps are 1-indexed and serialized as their number. Forward movement is
/// one step at a time; [`WizardStep::Success`] is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    /// One-time vs. installment payment option.
    #[default]
    TicketOptions = 1,
    /// Merchandise picks and pass terms.
    PassDetails = 2,
    /// Identity, password and shipping address.
    UserInfo = 3,
    /// Card capture and order submission.
    Payment = 4,
    /// Read-only confirmation.
    Success = 5,
}

impl WizardStep {
    /// First step.
    pub const FIRST: Self = Self::TicketOptions;

    /// Terminal step.
    pub const LAST: Self = Self::Success;

    /// The 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Parse a step from its number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStep`] for numbers outside `1..=5`.
    pub const fn from_number(n: u8) -> Result<Self, InvalidStep> {
        match n {
            1 => Ok(Self::TicketOptions),
            2 => Ok(Self::PassDetails),
            3 => Ok(Self::UserInfo),
            4 => Ok(Self::Payment),
            5 => Ok(Self::Success),
            other => Err(InvalidStep(other)),
        }
    }

    /// The following step, saturating at [`WizardStep::Success`].
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::TicketOptions => Self::PassDetails,
            Self::PassDetails => Self::UserInfo,
            Self::UserInfo => Self::Payment,
            Self::Payment | Self::Success => Self::Success,
        }
    }

    /// The preceding step, saturating at [`WizardStep::TicketOptions`].
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::TicketOptions | Self::PassDetails => Self::TicketOptions,
            Self::UserInfo => Self::PassDetails,
            Self::Payment => Self::UserInfo,
            Self::Success => Self::Payment,
        }
    }

    /// Whether a draft may be saved while on this step (strictly between 1 and 5).
    #[must_use]
    pub const fn is_persistable(self) -> bool {
        matches!(self, Self::PassDetails | Self::UserInfo | Self::Payment)
    }

    /// Whether this is the terminal success step.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short machine name for logs and API views.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TicketOptions => "ticket_options",
            Self::PassDetails => "pass_details",
            Self::UserInfo => "user_info",
            Self::Payment => "payment",
            Self::Success => "success",
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = InvalidStep;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n)
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_saturates_at_success() {
        assert_eq!(WizardStep::Payment.next(), WizardStep::Success);
        assert_eq!(WizardStep::Success.next(), WizardStep::Success);
    }

    #[test]
    fn test_previous_saturates_at_first() {
        assert_eq!(WizardStep::PassDetails.previous(), WizardStep::TicketOptions);
        assert_eq!(WizardStep::TicketOptions.previous(), WizardStep::TicketOptions);
    }

    #[test]
    fn test_persistable_steps() {
        let persistable: Vec<u8> = (1..=5)
            .filter_map(|n| WizardStep::from_number(n).ok())
            .filter(|s| s.is_persistable())
            .map(WizardStep::number)
            .collect();
        assert_eq!(persistable, vec![2, 3, 4]);
    }

    #[test]
    fn test_from_number_rejects_out_of_range() {
        assert_eq!(WizardStep::from_number(0), Err(InvalidStep(0)));
        assert_eq!(WizardStep::from_number(6), Err(InvalidStep(6)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&WizardStep::UserInfo).unwrap_or_default();
        assert_eq!(json, "3");

        let parsed: Result<WizardStep, _> = serde_json::from_str("9");
        assert!(parsed.is_err());
    }
}
