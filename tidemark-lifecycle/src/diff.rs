//! Policy differ — phase/action-level patch with toggle-disable synthesis.
//!
//! The one negative instruction in the whole engine lives here: a toggle
//! that the previous declared state enabled and the new desired state omits
//! becomes an explicit `enabled: false` in the patch. The remote never
//! treats absence as "off" once a toggle has been turned on, so the disable
//! must be stated; it is derived from the previous *declared* document, not
//! from a structural diff of the desired document alone.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::action::{Action, Toggle};
use crate::error::PolicyError;
use crate::phase::{ActionKind, PhaseKind};
use crate::policy::{PhaseDefinition, PolicyDocument};

/// Patch for one phase.
///
/// `min_age`: outer `None` = unchanged, `Some(None)` = clear, `Some(Some(v))`
/// = set. `actions`: `None` = explicit unset; a toggle disable is the
/// positive instruction `Some(Toggle { enabled: false })`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PhasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<Option<String>>,
    pub actions: BTreeMap<ActionKind, Option<Action>>,
}

impl PhasePatch {
    pub fn is_empty(&self) -> bool {
        self.min_age.is_none() && self.actions.is_empty()
    }
}

/// Patch for a whole policy. A `None` phase slot removes the phase.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PolicyPatch {
    pub phases: BTreeMap<PhaseKind, Option<PhasePatch>>,
}

impl PolicyPatch {
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Diff the previous declared policy against the new desired policy.
///
/// Idempotent: `diff(p, p)` is empty. Both documents are validated first;
/// nothing escapes on error.
pub fn diff(previous: &PolicyDocument, desired: &PolicyDocument) -> Result<PolicyPatch, PolicyError> {
    previous.validate()?;
    desired.validate()?;

    let mut patch = PolicyPatch::default();

    for (kind, desired_phase) in &desired.phases {
        match previous.phases.get(kind) {
            Some(previous_phase) => {
                let phase_patch = diff_phase(previous_phase, desired_phase);
                if !phase_patch.is_empty() {
                    patch.phases.insert(*kind, Some(phase_patch));
                }
            }
            None => {
                patch.phases.insert(*kind, Some(full_phase(desired_phase)));
            }
        }
    }

    for kind in previous.phases.keys() {
        if !desired.phases.contains_key(kind) {
            patch.phases.insert(*kind, None);
        }
    }

    Ok(patch)
}

fn diff_phase(previous: &PhaseDefinition, desired: &PhaseDefinition) -> PhasePatch {
    let mut patch = PhasePatch::default();

    if previous.min_age != desired.min_age {
        patch.min_age = Some(desired.min_age.clone());
    }

    for (kind, action) in &desired.actions {
        if previous.actions.get(kind) != Some(action) {
            patch.actions.insert(*kind, Some(action.clone()));
        }
    }

    for (kind, action) in &previous.actions {
        if desired.actions.contains_key(kind) {
            continue;
        }
        if kind.is_toggle() && action.as_toggle().is_some_and(|t| t.enabled) {
            // Absence does not mean off; state the disable explicitly.
            patch.actions.insert(*kind, Some(Action::Toggle(Toggle::off())));
        } else if !kind.is_toggle() {
            patch.actions.insert(*kind, None);
        }
        // A previously-disabled toggle that disappears needs no instruction.
    }

    patch
}

/// A patch that sets every declared piece of a brand-new phase.
fn full_phase(desired: &PhaseDefinition) -> PhasePatch {
    PhasePatch {
        min_age: desired.min_age.clone().map(Some),
        actions: desired
            .actions
            .iter()
            .map(|(kind, action)| (*kind, Some(action.clone())))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
