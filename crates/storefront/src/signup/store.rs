//! Single-slot draft persistence.
//!
//! A [`DraftSlot`] holds at most one raw record. [`DraftStore`] layers the
//! draft rules on top: what may be saved, when a stored record counts as
//! absent, and lazy cleanup of stale or unreadable records.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{debug, warn};

use ticketwave_core::signup::{FormData, WizardDraft, WizardStep};

use crate::models::session_keys;

/// Errors from draft persistence.
#[derive(Debug, Error)]
pub enum DraftStoreError {
    /// Session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Draft could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The slot cannot be used right now.
    #[error("draft slot unavailable: {0}")]
    Unavailable(String),
}

/// Storage for a single raw draft record.
pub trait DraftSlot: Send + Sync {
    /// Read the stored record, if any.
    fn read(&self) -> impl Future<Output = Result<Option<String>, DraftStoreError>> + Send;

    /// Replace the stored record.
    fn write(&self, record: String) -> impl Future<Output = Result<(), DraftStoreError>> + Send;

    /// Remove the stored record. Removing an empty slot succeeds.
    fn remove(&self) -> impl Future<Output = Result<(), DraftStoreError>> + Send;
}

/// In-process slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    record: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored record.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the raw record, bypassing draft rules.
    pub fn set_raw(&self, record: Option<String>) {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = record;
    }
}

impl DraftSlot for MemorySlot {
    async fn read(&self) -> Result<Option<String>, DraftStoreError> {
        Ok(self.raw())
    }

    async fn write(&self, record: String) -> Result<(), DraftStoreError> {
        self.set_raw(Some(record));
        Ok(())
    }

    async fn remove(&self) -> Result<(), DraftStoreError> {
        self.set_raw(None);
        Ok(())
    }
}

/// Slot kept in the visitor's session.
///
/// One slot per browser session, so the single-draft policy applies per
/// visitor rather than to the whole site.
#[derive(Debug, Clone)]
pub struct SessionSlot {
    session: Session,
}

impl SessionSlot {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl DraftSlot for SessionSlot {
    async fn read(&self) -> Result<Option<String>, DraftStoreError> {
        Ok(self.session.get::<String>(session_keys::SIGNUP_DRAFT).await?)
    }

    async fn write(&self, record: String) -> Result<(), DraftStoreError> {
        self.session
            .insert(session_keys::SIGNUP_DRAFT, record)
            .await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), DraftStoreError> {
        self.session
            .remove::<String>(session_keys::SIGNUP_DRAFT)
            .await?;
        Ok(())
    }
}

/// Draft persistence over a single slot.
#[derive(Debug, Clone)]
pub struct DraftStore<S> {
    slot: S,
}

impl<S: DraftSlot> DraftStore<S> {
    #[must_use]
    pub const fn new(slot: S) -> Self {
        Self { slot }
    }

    /// The underlying slot.
    #[must_use]
    pub const fn slot(&self) -> &S {
        &self.slot
    }

    /// Save a draft stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if the write fails.
    pub async fn save(
        &self,
        email: &str,
        step: WizardStep,
        form_data: &FormData,
    ) -> Result<bool, DraftStoreError> {
        self.save_at(email, step, form_data, Utc::now()).await
    }

    /// Save a draft stamped with `now`, overwriting whatever the slot held.
    ///
    /// Returns `false` without touching the slot when `email` is blank or the
    /// step is not one that is ever persisted.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if the write fails.
    pub async fn save_at(
        &self,
        email: &str,
        step: WizardStep,
        form_data: &FormData,
        now: DateTime<Utc>,
    ) -> Result<bool, DraftStoreError> {
        let email = email.trim();
        if email.is_empty() || !step.is_persistable() {
            debug!(%step, "Draft not saved");
            return Ok(false);
        }

        let draft = WizardDraft::new(email, step, form_data.clone(), now);
        self.slot.write(serde_json::to_string(&draft)?).await?;
        debug!(%step, "Draft saved");
        Ok(true)
    }

    /// Load the stored draft, if present and fresh.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if reading or cleanup fails.
    pub async fn load(&self) -> Result<Option<WizardDraft>, DraftStoreError> {
        self.load_at(None, Utc::now()).await
    }

    /// Load the stored draft only if it belongs to `email`.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if reading or cleanup fails.
    pub async fn load_for(&self, email: &str) -> Result<Option<WizardDraft>, DraftStoreError> {
        self.load_at(Some(email), Utc::now()).await
    }

    /// Load the stored draft as of `now`.
    ///
    /// Unreadable and stale records are removed and reported as absent. A
    /// record for a different email than `email` is left in place.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if reading or cleanup fails.
    pub async fn load_at(
        &self,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<WizardDraft>, DraftStoreError> {
        let Some(raw) = self.slot.read().await? else {
            return Ok(None);
        };

        let draft = match serde_json::from_str::<WizardDraft>(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable draft");
                self.slot.remove().await?;
                return Ok(None);
            }
        };

        if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty())
            && draft.email != email
        {
            return Ok(None);
        }

        if draft.is_stale_at(now) {
            debug!(last_updated = %draft.last_updated, "Discarding stale draft");
            self.slot.remove().await?;
            return Ok(None);
        }

        if !draft.current_step.is_persistable() {
            warn!(step = %draft.current_step, "Discarding draft outside steps 2-4");
            self.slot.remove().await?;
            return Ok(None);
        }

        Ok(Some(draft))
    }

    /// Remove any stored draft. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the slot's error if removal fails.
    pub async fn clear(&self) -> Result<(), DraftStoreError> {
        self.slot.remove().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn form() -> FormData {
        FormData::try_from(json!({
            "email": "a@b.com",
            "paymentOption": "installment",
            "merchandise": ["hat", "poster"],
        }))
        .unwrap_or_default()
    }

    fn store() -> DraftStore<MemorySlot> {
        DraftStore::new(MemorySlot::new())
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = store();
        for step in [WizardStep::PassDetails, WizardStep::UserInfo, WizardStep::Payment] {
            assert!(store.save("a@b.com", step, &form()).await.expect("saves"));

            let draft = store.load().await.expect("loads").expect("present");
            assert_eq!(draft.email, "a@b.com");
            assert_eq!(draft.current_step, step);
            assert_eq!(draft.form_data, form());
        }
    }

    #[tokio::test]
    async fn test_blank_email_is_not_saved() {
        let store = store();
        assert!(!store.save("", WizardStep::PassDetails, &form()).await.expect("ok"));
        assert!(!store.save("   ", WizardStep::UserInfo, &form()).await.expect("ok"));
        assert_eq!(store.slot().raw(), None);
    }

    #[tokio::test]
    async fn test_first_and_terminal_steps_are_not_saved() {
        let store = store();
        assert!(!store.save("a@b.com", WizardStep::TicketOptions, &form()).await.expect("ok"));
        assert!(!store.save("a@b.com", WizardStep::Success, &form()).await.expect("ok"));
        assert_eq!(store.slot().raw(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites_other_email() {
        let store = store();
        store.save("a@b.com", WizardStep::UserInfo, &form()).await.expect("saves");
        store.save("c@d.com", WizardStep::PassDetails, &FormData::new()).await.expect("saves");

        let draft = store.load().await.expect("loads").expect("present");
        assert_eq!(draft.email, "c@d.com");
        assert_eq!(draft.current_step, WizardStep::PassDetails);
    }

    #[tokio::test]
    async fn test_stale_draft_is_cleared_on_load() {
        let store = store();
        let now = Utc::now();
        store
            .save_at("a@b.com", WizardStep::UserInfo, &form(), now - Duration::hours(25))
            .await
            .expect("saves");

        assert!(store.load_at(None, now).await.expect("loads").is_none());
        assert_eq!(store.slot().raw(), None);
    }

    #[tokio::test]
    async fn test_draft_at_exactly_ttl_is_fresh() {
        let store = store();
        let now = Utc::now();
        store
            .save_at("a@b.com", WizardStep::UserInfo, &form(), now - Duration::hours(24))
            .await
            .expect("saves");
        assert!(store.load_at(None, now).await.expect("loads").is_some());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_cleared_on_load() {
        let store = store();
        store.slot().set_raw(Some("{not json".to_string()));
        assert!(store.load().await.expect("loads").is_none());
        assert_eq!(store.slot().raw(), None);

        store
            .slot()
            .set_raw(Some(r#"{"email":"a@b.com","currentStep":9,"formData":{},"lastUpdated":0}"#.to_string()));
        assert!(store.load().await.expect("loads").is_none());
        assert_eq!(store.slot().raw(), None);
    }

    #[tokio::test]
    async fn test_record_at_first_or_terminal_step_is_cleared_on_load() {
        let store = store();
        let now = Utc::now().timestamp_millis();
        for step in [1, 5] {
            store.slot().set_raw(Some(format!(
                r#"{{"email":"a@b.com","currentStep":{step},"formData":{{}},"lastUpdated":{now}}}"#
            )));
            assert!(store.load().await.expect("loads").is_none());
            assert_eq!(store.slot().raw(), None);
        }
    }

    #[tokio::test]
    async fn test_load_for_other_email_keeps_record() {
        let store = store();
        store.save("a@b.com", WizardStep::UserInfo, &form()).await.expect("saves");

        assert!(store.load_for("x@y.com").await.expect("loads").is_none());
        assert!(store.slot().raw().is_some());
        assert!(store.load_for("a@b.com").await.expect("loads").is_some());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = store();
        store.clear().await.expect("clears empty");
        store.save("a@b.com", WizardStep::UserInfo, &form()).await.expect("saves");
        store.clear().await.expect("clears");
        store.clear().await.expect("clears again");
        assert!(store.load().await.expect("loads").is_none());
    }
}
