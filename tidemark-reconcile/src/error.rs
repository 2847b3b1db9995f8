//! Error types for tidemark-reconcile.
//!
//! Every variant below `Conflict`..`ImmutableSetting` is a validation-time,
//! non-retryable contradiction in the desired configuration; all of them are
//! raised before any patch reaches a store.

use std::path::PathBuf;

use thiserror::Error;

use tidemark_core::error::{RegistryError, ValueError};
use tidemark_core::types::{SettingName, SourceTag};
use tidemark_lifecycle::PolicyError;

use crate::store::StoreError;

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Two sources declared the same key.
    #[error("setting '{name}' is declared by both the {first} and the {second}")]
    Conflict {
        name: SettingName,
        first: SourceTag,
        second: SourceTag,
    },

    /// One source declared both a scalar value and a value list for a key.
    #[error("setting '{name}' in the {source} declares both a value and a value list")]
    AmbiguousValue { source: SourceTag, name: SettingName },

    /// One source declared a key with neither a scalar value nor a value list.
    #[error("setting '{name}' in the {source} declares no value")]
    MissingValue { source: SourceTag, name: SettingName },

    /// A static key was changed, removed, or first set after creation.
    #[error("setting '{name}' is static and cannot change after creation")]
    ImmutableSetting { name: SettingName },

    /// A raw value failed coercion to its registered kind.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// An error from the policy engine.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// An error from the key registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The remote store rejected a patch or was unreachable.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (snapshot store).
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`ReconcileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.into(),
        source,
    }
}
