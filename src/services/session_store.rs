//! Session-scoped key-value storage for the metadata draft.
//!
//! The store lives as long as the wizard session. Draft reads and writes
//! are best-effort and never stop the form from working.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{WizardError, WizardResult};

/// Key holding the JSON-encoded metadata draft.
pub const METADATA_DRAFT_KEY: &str = "signcheck.metadata_draft";

/// Field id → value snapshot of the metadata form.
pub type Draft = BTreeMap<String, String>;

/// String key-value storage with session lifetime.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> WizardResult<Option<String>>;
    fn set(&self, key: &str, value: String) -> WizardResult<()>;
}

/// In-memory store, shared between clones.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> WizardResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> WizardResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed access to the metadata draft on top of a [`SessionStore`].
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn SessionStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Load the draft. Missing or corrupt data yields an empty draft.
    #[instrument(skip(self))]
    pub fn load(&self) -> Draft {
        match self.try_load() {
            Ok(draft) => draft,
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable metadata draft");
                Draft::new()
            }
        }
    }

    /// Save the draft. Failures are logged and otherwise ignored.
    #[instrument(skip(self, draft), fields(fields = draft.len()))]
    pub fn save(&self, draft: &Draft) {
        if let Err(e) = self.try_save(draft) {
            debug!(error = %e, "Failed to persist metadata draft");
        }
    }

    fn try_load(&self) -> WizardResult<Draft> {
        let Some(raw) = self.store.get(METADATA_DRAFT_KEY)? else {
            return Ok(Draft::new());
        };
        serde_json::from_str(&raw).map_err(|e| WizardError::Persistence(e.to_string()))
    }

    fn try_save(&self, draft: &Draft) -> WizardResult<()> {
        let raw =
            serde_json::to_string(draft).map_err(|e| WizardError::Persistence(e.to_string()))?;
        self.store.set(METADATA_DRAFT_KEY, raw)?;
        debug!("Metadata draft saved");
        Ok(())
    }
}
