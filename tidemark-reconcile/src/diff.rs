//! Settings differ — minimal set/unset patch between two canonical maps.
//!
//! Equality is canonical, never textual: both inputs are re-coerced against
//! the registry first, so a previous `"2"` read back from the remote store
//! and a desired `2` for an integer key compare equal and produce no patch
//! entry.

use std::collections::BTreeMap;

use serde::Serialize;

use tidemark_core::types::{Mutability, SettingName, SettingsDocument};
use tidemark_core::value::SettingValue;
use tidemark_core::{KeyRegistry, SettingsMap};

use crate::error::ReconcileError;

/// Flat patch: `Some` sets a value, `None` serializes as JSON `null` and
/// deletes the key; omitted names are left unchanged.
pub type SettingsPatch = BTreeMap<SettingName, Option<SettingValue>>;

/// Cluster-scoped patch — both collections diffed independently.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClusterPatch {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub persistent: SettingsPatch,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub transient: SettingsPatch,
}

impl ClusterPatch {
    pub fn is_empty(&self) -> bool {
        self.persistent.is_empty() && self.transient.is_empty()
    }
}

/// Re-coerce every value in `map` to its key's registered kind.
///
/// Read-back state arrives with values serialized as strings; desired state
/// arrives typed. Running both through the registry makes them comparable.
pub fn canonicalize(map: &SettingsMap, registry: &KeyRegistry) -> Result<SettingsMap, ReconcileError> {
    let mut out = SettingsMap::new();
    for (name, value) in map {
        let canonical = match value {
            SettingValue::Str(raw) => registry.coerce_str(name, raw)?,
            other => other.clone(),
        };
        out.insert(name.clone(), canonical);
    }
    Ok(out)
}

/// Diff `previous` against `desired`, producing the minimal patch.
///
/// `first_apply` marks the first-ever apply of this resource: static keys
/// may be set freely then, and only then. On any later apply a patch entry
/// touching a static key — set, change, or unset — aborts with
/// `ImmutableSetting` before the patch escapes.
pub fn diff(
    previous: &SettingsMap,
    desired: &SettingsMap,
    registry: &KeyRegistry,
    first_apply: bool,
) -> Result<SettingsPatch, ReconcileError> {
    let previous = canonicalize(previous, registry)?;
    let desired = canonicalize(desired, registry)?;

    let mut patch = SettingsPatch::new();

    for (name, value) in &desired {
        if previous.get(name) == Some(value) {
            continue;
        }
        guard_static(name, registry, first_apply)?;
        patch.insert(name.clone(), Some(value.clone()));
    }

    for name in previous.keys() {
        if desired.contains_key(name) {
            continue;
        }
        guard_static(name, registry, first_apply)?;
        patch.insert(name.clone(), None);
    }

    Ok(patch)
}

/// Diff a cluster document per collection.
pub fn diff_document(
    previous: &SettingsDocument,
    desired: &SettingsDocument,
    registry: &KeyRegistry,
    first_apply: bool,
) -> Result<ClusterPatch, ReconcileError> {
    Ok(ClusterPatch {
        persistent: diff(&previous.persistent, &desired.persistent, registry, first_apply)?,
        transient: diff(&previous.transient, &desired.transient, registry, first_apply)?,
    })
}

fn guard_static(
    name: &SettingName,
    registry: &KeyRegistry,
    first_apply: bool,
) -> Result<(), ReconcileError> {
    if !first_apply && registry.mutability_of(name) == Mutability::Static {
        return Err(ReconcileError::ImmutableSetting { name: name.clone() });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
