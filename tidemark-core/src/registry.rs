//! Immutable key registry.
//!
//! The registry maps setting names to their value kind and mutability class.
//! It is constructed once — from the builtin table, optionally extended by a
//! YAML overlay — and passed by reference into each reconciliation call. It
//! is never mutated after construction.
//!
//! # Storage layout
//!
//! ```text
//! ~/.tidemark/
//!   keys.yaml    (optional overlay: site-specific key descriptors)
//! ```
//!
//! # API pattern
//!
//! - `load_at(home: &Path)` — explicit home; used in tests with `TempDir`
//! - `load()` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrapper; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, ValueError};
use crate::types::{KeyDescriptor, Mutability, SettingName, ValueKind};
use crate::value::{self, SettingValue};

/// Immutable lookup table of known setting keys.
///
/// Keys outside the table are treated as dynamic strings: the remote store
/// accepts arbitrary keys and serializes them as strings, so only keys whose
/// kind or mutability actually matters need an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyRegistry {
    keys: BTreeMap<SettingName, KeyDescriptor>,
}

/// On-disk overlay payload (`keys.yaml`).
#[derive(Debug, Serialize, Deserialize)]
struct KeyOverlayFile {
    keys: Vec<KeyDescriptor>,
}

impl KeyRegistry {
    /// An empty registry. Every key falls back to dynamic-string handling.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin table of well-known keys.
    pub fn builtin() -> Self {
        use Mutability::{Dynamic, Static};
        use ValueKind::{Bool, Int, String, StringList};

        let table: &[(&str, ValueKind, Mutability)] = &[
            ("index.number_of_shards", Int, Static),
            ("index.number_of_replicas", Int, Dynamic),
            ("index.number_of_routing_shards", Int, Static),
            ("index.routing_partition_size", Int, Static),
            ("index.codec", String, Static),
            ("index.refresh_interval", String, Dynamic),
            ("index.max_result_window", Int, Dynamic),
            ("index.priority", Int, Dynamic),
            ("index.blocks.read_only", Bool, Dynamic),
            ("index.blocks.read", Bool, Dynamic),
            ("index.blocks.write", Bool, Dynamic),
            ("index.blocks.metadata", Bool, Dynamic),
            ("index.auto_expand_replicas", String, Dynamic),
            ("index.search.idle.after", String, Dynamic),
            ("index.sort.field", StringList, Static),
            ("index.sort.order", StringList, Static),
            ("index.query.default_field", StringList, Dynamic),
            ("index.routing.allocation.include._tier_preference", String, Dynamic),
            ("index.lifecycle.name", String, Dynamic),
            ("index.lifecycle.rollover_alias", String, Dynamic),
            ("indices.lifecycle.poll_interval", String, Dynamic),
            ("indices.recovery.max_bytes_per_sec", String, Dynamic),
            ("cluster.routing.allocation.enable", String, Dynamic),
            ("cluster.routing.rebalance.enable", String, Dynamic),
            ("cluster.routing.allocation.awareness.attributes", StringList, Dynamic),
            ("cluster.max_shards_per_node", Int, Dynamic),
            ("cluster.blocks.read_only", Bool, Dynamic),
            ("action.auto_create_index", String, Dynamic),
            ("action.destructive_requires_name", Bool, Dynamic),
            ("search.default_search_timeout", String, Dynamic),
        ];

        let mut keys = BTreeMap::new();
        for (name, kind, mutability) in table {
            let name = SettingName::from(*name);
            keys.insert(name.clone(), KeyDescriptor { name, kind: *kind, mutability: *mutability });
        }
        Self { keys }
    }

    /// Builder extension: returns a registry with `descriptor` added,
    /// replacing any existing entry for the same name.
    pub fn with_key(mut self, descriptor: KeyDescriptor) -> Self {
        self.keys.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Look up a key. `None` means the key is not in the table.
    pub fn describe(&self, name: &SettingName) -> Option<&KeyDescriptor> {
        self.keys.get(name)
    }

    /// The value kind for `name`; unregistered keys are strings.
    pub fn kind_of(&self, name: &SettingName) -> ValueKind {
        self.describe(name).map_or(ValueKind::String, |d| d.kind)
    }

    /// The mutability class for `name`; unregistered keys are dynamic.
    pub fn mutability_of(&self, name: &SettingName) -> Mutability {
        self.describe(name).map_or(Mutability::Dynamic, |d| d.mutability)
    }

    /// Coerce a raw string to the canonical form for `name`.
    pub fn coerce_str(&self, name: &SettingName, raw: &str) -> Result<SettingValue, ValueError> {
        value::coerce_str(name, self.kind_of(name), raw)
    }

    /// Coerce a JSON value to the canonical form for `name`.
    pub fn coerce_json(
        &self,
        name: &SettingName,
        raw: &serde_json::Value,
    ) -> Result<SettingValue, ValueError> {
        value::coerce_json(name, self.kind_of(name), raw)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Overlay loading
// ---------------------------------------------------------------------------

/// `<home>/.tidemark/keys.yaml` — pure, no I/O.
pub fn overlay_path_at(home: &Path) -> PathBuf {
    home.join(".tidemark").join("keys.yaml")
}

/// Builtin table plus the overlay at `<home>/.tidemark/keys.yaml`, if present.
///
/// Overlay entries replace builtin entries for the same name. A malformed
/// overlay fails with `RegistryError::Parse` carrying the path.
pub fn load_at(home: &Path) -> Result<KeyRegistry, RegistryError> {
    let mut registry = KeyRegistry::builtin();
    let path = overlay_path_at(home);
    if !path.exists() {
        return Ok(registry);
    }
    let contents = std::fs::read_to_string(&path)?;
    let overlay: KeyOverlayFile =
        serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })?;
    for descriptor in overlay.keys {
        registry = registry.with_key(descriptor);
    }
    Ok(registry)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<KeyRegistry, RegistryError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
