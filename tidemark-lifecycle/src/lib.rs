//! # tidemark-lifecycle
//!
//! Phase/action policy model: the closed action variant set, the per-phase
//! allowed-action table, expansion to and flattening from the remote wire
//! shape, and the policy differ with toggle-disable synthesis.

pub mod action;
pub mod diff;
pub mod error;
pub mod phase;
pub mod policy;
pub mod wire;

pub use action::{
    Action, Allocate, DeleteIndex, Forcemerge, Rollover, SearchableSnapshot, SetPriority,
    Shrink, Toggle, WaitForSnapshot,
};
pub use diff::{diff, PhasePatch, PolicyPatch};
pub use error::PolicyError;
pub use phase::{ActionKind, PhaseKind};
pub use policy::{PhaseDefinition, PolicyDocument};
pub use wire::{expand, flatten, WirePhase, WirePolicy};
