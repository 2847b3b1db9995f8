//! Error types for tidemark-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{SettingName, ValueKind};

/// All errors that can arise from key registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse key overlay at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.tidemark/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors raised while coercing a raw declared value into its canonical form.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The raw value cannot be parsed as the key's registered kind.
    #[error("setting '{name}': expected {expected} value, got '{raw}'")]
    TypeMismatch {
        name: SettingName,
        expected: ValueKind,
        raw: String,
    },
}
