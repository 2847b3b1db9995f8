//! Remote store seams and in-memory implementations.
//!
//! Transport, retry, and authentication are out of scope; these traits are
//! the synchronous boundary the engine hands patches to. The in-memory
//! implementations materialize patch semantics exactly as the remote would:
//! `null` deletes a key, an absent key is left unchanged, an unset action is
//! removed, and a toggle disable removes the action from the wire document.

use std::collections::BTreeMap;

use thiserror::Error;

use tidemark_core::types::{SettingsDocument, SettingsMap};
use tidemark_lifecycle::{PolicyPatch, WirePolicy};

use crate::diff::{ClusterPatch, SettingsPatch};

/// Errors a remote store can surface.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the patch (validation, permission, conflict).
    #[error("store rejected the patch: {reason}")]
    Rejected { reason: String },

    /// The store could not be reached or answered with garbage.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Cluster-scoped settings endpoint: one patch updates both collections
/// atomically.
pub trait ClusterSettingsStore {
    fn apply(&mut self, patch: &ClusterPatch) -> Result<(), StoreError>;
    fn fetch(&self) -> Result<SettingsDocument, StoreError>;
}

/// Per-index settings endpoint.
pub trait IndexSettingsStore {
    fn apply(&mut self, index: &str, patch: &SettingsPatch) -> Result<(), StoreError>;
    fn fetch(&self, index: &str) -> Result<SettingsMap, StoreError>;
}

/// Lifecycle policy endpoint.
pub trait PolicyStore {
    fn apply(&mut self, name: &str, patch: &PolicyPatch) -> Result<(), StoreError>;
    fn fetch(&self, name: &str) -> Result<Option<WirePolicy>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

fn apply_to_map(map: &mut SettingsMap, patch: &SettingsPatch) {
    for (name, value) in patch {
        match value {
            Some(value) => {
                map.insert(name.clone(), value.clone());
            }
            None => {
                map.remove(name);
            }
        }
    }
}

/// In-memory cluster settings store.
#[derive(Debug, Default)]
pub struct InMemoryClusterStore {
    document: SettingsDocument,
    reject_next: Option<String>,
}

impl InMemoryClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: SettingsDocument) -> Self {
        Self {
            document,
            reject_next: None,
        }
    }

    /// Make the next `apply` fail with `StoreError::Rejected`.
    pub fn reject_next(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }
}

impl ClusterSettingsStore for InMemoryClusterStore {
    fn apply(&mut self, patch: &ClusterPatch) -> Result<(), StoreError> {
        if let Some(reason) = self.reject_next.take() {
            return Err(StoreError::Rejected { reason });
        }
        apply_to_map(&mut self.document.persistent, &patch.persistent);
        apply_to_map(&mut self.document.transient, &patch.transient);
        Ok(())
    }

    fn fetch(&self) -> Result<SettingsDocument, StoreError> {
        Ok(self.document.clone())
    }
}

/// In-memory per-index settings store.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    indices: BTreeMap<String, SettingsMap>,
    reject_next: Option<String>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_next(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }
}

impl IndexSettingsStore for InMemoryIndexStore {
    fn apply(&mut self, index: &str, patch: &SettingsPatch) -> Result<(), StoreError> {
        if let Some(reason) = self.reject_next.take() {
            return Err(StoreError::Rejected { reason });
        }
        apply_to_map(self.indices.entry(index.to_owned()).or_default(), patch);
        Ok(())
    }

    fn fetch(&self, index: &str) -> Result<SettingsMap, StoreError> {
        Ok(self.indices.get(index).cloned().unwrap_or_default())
    }
}

/// In-memory lifecycle policy store.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: BTreeMap<String, WirePolicy>,
    reject_next: Option<String>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_next(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn apply(&mut self, name: &str, patch: &PolicyPatch) -> Result<(), StoreError> {
        if let Some(reason) = self.reject_next.take() {
            return Err(StoreError::Rejected { reason });
        }
        let wire = self.policies.entry(name.to_owned()).or_default();
        for (phase, slot) in &patch.phases {
            match slot {
                None => {
                    wire.phases.remove(phase.name());
                }
                Some(phase_patch) => {
                    let wire_phase = wire.phases.entry(phase.name().to_owned()).or_default();
                    if let Some(min_age) = &phase_patch.min_age {
                        wire_phase.min_age = min_age.clone();
                    }
                    for (kind, action) in &phase_patch.actions {
                        match action {
                            None => {
                                wire_phase.actions.remove(kind.name());
                            }
                            Some(action) => match action.as_toggle() {
                                Some(toggle) if !toggle.enabled => {
                                    wire_phase.actions.remove(kind.name());
                                }
                                Some(_) => {
                                    wire_phase.actions.insert(
                                        kind.name().to_owned(),
                                        serde_json::Value::Object(serde_json::Map::new()),
                                    );
                                }
                                None => {
                                    wire_phase.actions.insert(
                                        kind.name().to_owned(),
                                        serde_json::to_value(action).unwrap_or_default(),
                                    );
                                }
                            },
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn fetch(&self, name: &str) -> Result<Option<WirePolicy>, StoreError> {
        Ok(self.policies.get(name).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
