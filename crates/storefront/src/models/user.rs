//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ticketwave_core::{Email, UserId};

/// A TicketWave account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Whether the email has been verified. Social logins start verified.
    pub email_verified: bool,
    /// Whether the user owns an active pass.
    pub has_ticket: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Where the web app should send the user after a password login.
    #[must_use]
    pub const fn login_redirect(&self) -> &'static str {
        if !self.email_verified {
            "/verify-email"
        } else if !self.has_ticket {
            "/tickets"
        } else {
            "/"
        }
    }

    /// Where to send the user after a Google or Apple login.
    ///
    /// Provider accounts are verified by the provider, so only ticket
    /// ownership matters.
    #[must_use]
    pub const fn social_redirect(&self) -> &'static str {
        if self.has_ticket { "/" } else { "/tickets" }
    }
}

/// Public JSON representation of a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub is_email_verified: bool,
    pub has_ticket: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_email_verified: user.email_verified,
            has_ticket: user.has_ticket,
        }
    }
}
