//! Policy documents — [`PhaseDefinition`], [`PolicyDocument`], validation.
//!
//! Documents are constructed fresh per reconciliation call and never mutated
//! in place; reconciliation produces a new patch plus a new snapshot.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::action::Action;
use crate::error::PolicyError;
use crate::phase::{ActionKind, PhaseKind};

/// One phase: an optional minimum age plus its declared actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PhaseDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<ActionKind, Action>,
}

impl PhaseDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_age(mut self, min_age: impl Into<String>) -> Self {
        self.min_age = Some(min_age.into());
        self
    }

    pub fn with_action(mut self, kind: ActionKind, action: Action) -> Self {
        self.actions.insert(kind, action);
        self
    }
}

// Deserialization dispatches on the map key: the untagged `Action` variants
// are all-optional structs and cannot self-describe.
impl<'de> Deserialize<'de> for PhaseDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            min_age: Option<String>,
            #[serde(default)]
            actions: BTreeMap<ActionKind, serde_json::Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut actions = BTreeMap::new();
        for (kind, value) in raw.actions {
            let action = Action::from_structured(kind, &value).map_err(D::Error::custom)?;
            actions.insert(kind, action);
        }
        Ok(PhaseDefinition {
            min_age: raw.min_age,
            actions,
        })
    }
}

/// A full policy: phases keyed by kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub phases: BTreeMap<PhaseKind, PhaseDefinition>,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase(mut self, kind: PhaseKind, phase: PhaseDefinition) -> Self {
        self.phases.insert(kind, phase);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Check every declared action against the per-phase allowed set and its
    /// variant shape. Fails on the first offending action.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (phase, definition) in &self.phases {
            for (kind, action) in &definition.actions {
                if !phase.allows(*kind) {
                    return Err(PolicyError::UnsupportedAction {
                        phase: *phase,
                        action: *kind,
                    });
                }
                if !action.matches_kind(*kind) {
                    return Err(PolicyError::ActionShape {
                        phase: *phase,
                        action: *kind,
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
