//! Wire form of a policy and the expand/flatten pair.
//!
//! # Wire shape
//!
//! ```text
//! {
//!   "phases": {
//!     "hot": {
//!       "min_age": "0ms",
//!       "actions": {
//!         "rollover": { "max_age": "30d" },
//!         "readonly": {}                    <- enabled toggle: empty object
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Disabled toggles are entirely absent from the wire form; the remote has
//! no body-level on/off flag for them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::PolicyError;
use crate::phase::{ActionKind, PhaseKind};
use crate::policy::{PhaseDefinition, PolicyDocument};

/// One phase as the remote stores it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WirePhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<String, serde_json::Value>,
}

/// A full policy as the remote stores it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WirePolicy {
    #[serde(default)]
    pub phases: BTreeMap<String, WirePhase>,
}

/// Expand a structured policy into the remote wire shape.
///
/// Parameterized actions serialize field-by-field with absent (`None`)
/// fields omitted; toggles are emitted as empty objects only when enabled.
pub fn expand(policy: &PolicyDocument) -> Result<WirePolicy, PolicyError> {
    policy.validate()?;

    let mut phases = BTreeMap::new();
    for (kind, definition) in &policy.phases {
        let mut actions = BTreeMap::new();
        for (action_kind, action) in &definition.actions {
            match action.as_toggle() {
                Some(toggle) if !toggle.enabled => continue,
                Some(_) => {
                    actions.insert(
                        action_kind.name().to_owned(),
                        serde_json::Value::Object(serde_json::Map::new()),
                    );
                }
                None => {
                    actions.insert(action_kind.name().to_owned(), serde_json::to_value(action)?);
                }
            }
        }
        phases.insert(
            kind.name().to_owned(),
            WirePhase {
                min_age: definition.min_age.clone(),
                actions,
            },
        );
    }
    Ok(WirePolicy { phases })
}

/// Flatten a remote wire policy back into the structured form.
///
/// A toggle's presence on the wire means it is enabled. Unknown phase or
/// action names fail; actions outside their phase's allowed set fail with
/// `UnsupportedAction`.
pub fn flatten(wire: &WirePolicy) -> Result<PolicyDocument, PolicyError> {
    let mut phases = BTreeMap::new();
    for (phase_name, wire_phase) in &wire.phases {
        let phase = PhaseKind::from_name(phase_name).ok_or_else(|| PolicyError::UnknownPhase {
            name: phase_name.clone(),
        })?;

        let mut actions = BTreeMap::new();
        for (action_name, value) in &wire_phase.actions {
            let kind =
                ActionKind::from_name(action_name).ok_or_else(|| PolicyError::UnknownAction {
                    name: action_name.clone(),
                })?;
            if !phase.allows(kind) {
                return Err(PolicyError::UnsupportedAction {
                    phase,
                    action: kind,
                });
            }
            actions.insert(kind, Action::from_wire(kind, value)?);
        }
        phases.insert(
            phase,
            PhaseDefinition {
                min_age: wire_phase.min_age.clone(),
                actions,
            },
        );
    }
    Ok(PolicyDocument { phases })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
