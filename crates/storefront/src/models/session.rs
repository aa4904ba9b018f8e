//! Request identity and session keys.

use serde::{Deserialize, Serialize};

use ticketwave_core::{Email, UserId};

/// Identity carried by a verified access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys for signup state.
pub mod keys {
    /// Serialized wizard controller state for this browser.
    pub const SIGNUP_WIZARD: &str = "signup_wizard";

    /// The single draft slot for this browser.
    pub const SIGNUP_DRAFT: &str = "signup_draft";
}
