//! Persisted wizard snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{FormData, WizardStep};

/// Drafts older than this many hours are discarded on load.
pub const DRAFT_TTL_HOURS: i64 = 24;

/// Snapshot of an in-progress signup.
///
/// Serialized as a JSON object with `email`, `currentStep`, `formData` and
/// `lastUpdated` (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDraft {
    pub email: String,
    pub current_step: WizardStep,
    pub form_data: FormData,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl WizardDraft {
    /// Build a draft stamped at `now`.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        current_step: WizardStep,
        form_data: FormData,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.into(),
            current_step,
            form_data,
            last_updated: now,
        }
    }

    /// Time-to-live after which a draft is stale.
    #[must_use]
    pub fn ttl() -> Duration {
        Duration::hours(DRAFT_TTL_HOURS)
    }

    /// Whether the draft is older than the TTL at `now`.
    ///
    /// A draft exactly at the TTL boundary is still fresh.
    #[must_use]
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_updated) > Self::ttl()
    }
}
