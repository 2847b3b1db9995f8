//! Error types for tidemark-lifecycle.

use thiserror::Error;

use crate::phase::{ActionKind, PhaseKind};

/// All errors that can arise from policy expansion, flattening, and diffing.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The action is not in the phase's allowed-action set.
    #[error("action '{action}' is not allowed in the {phase} phase")]
    UnsupportedAction { phase: PhaseKind, action: ActionKind },

    /// The action value's variant does not match the kind it is keyed under
    /// (e.g. a toggle body under a parameterized action name).
    #[error("action '{action}' in the {phase} phase has the wrong parameter shape")]
    ActionShape { phase: PhaseKind, action: ActionKind },

    /// A wire document names a phase this engine does not know.
    #[error("unknown phase '{name}' in wire document")]
    UnknownPhase { name: String },

    /// A wire document names an action this engine does not know.
    #[error("unknown action '{name}' in wire document")]
    UnknownAction { name: String },

    /// JSON (de)serialization error while crossing the wire boundary.
    #[error("wire serialization error: {0}")]
    Wire(#[from] serde_json::Error),
}
