//! Phase and action kinds — [`PhaseKind`], [`ActionKind`], and the
//! per-phase allowed-action table.
//!
//! # Allowed actions (remote documentation)
//!
//! | Phase  | Actions                                                                  |
//! |--------|--------------------------------------------------------------------------|
//! | hot    | rollover, set_priority, forcemerge, shrink, searchable_snapshot, readonly, unfollow |
//! | warm   | allocate, set_priority, forcemerge, shrink, readonly, unfollow           |
//! | cold   | allocate, set_priority, searchable_snapshot, readonly, freeze, unfollow  |
//! | frozen | searchable_snapshot, unfollow                                            |
//! | delete | wait_for_snapshot, delete                                                |

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PhaseKind
// ---------------------------------------------------------------------------

/// A lifecycle phase. Stored unordered; conventionally hot → warm → cold →
/// frozen → delete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Hot,
    Warm,
    Cold,
    Frozen,
    Delete,
}

impl PhaseKind {
    /// All phases, in conventional order.
    pub fn all() -> &'static [PhaseKind] {
        &[
            PhaseKind::Hot,
            PhaseKind::Warm,
            PhaseKind::Cold,
            PhaseKind::Frozen,
            PhaseKind::Delete,
        ]
    }

    /// Wire name of the phase.
    pub fn name(&self) -> &'static str {
        match self {
            PhaseKind::Hot => "hot",
            PhaseKind::Warm => "warm",
            PhaseKind::Cold => "cold",
            PhaseKind::Frozen => "frozen",
            PhaseKind::Delete => "delete",
        }
    }

    /// Parse a wire phase name.
    pub fn from_name(name: &str) -> Option<PhaseKind> {
        PhaseKind::all().iter().copied().find(|p| p.name() == name)
    }

    /// The actions this phase accepts.
    pub fn allowed_actions(&self) -> &'static [ActionKind] {
        use ActionKind::*;
        match self {
            PhaseKind::Hot => &[
                Rollover,
                SetPriority,
                Forcemerge,
                Shrink,
                SearchableSnapshot,
                Readonly,
                Unfollow,
            ],
            PhaseKind::Warm => &[Allocate, SetPriority, Forcemerge, Shrink, Readonly, Unfollow],
            PhaseKind::Cold => &[
                Allocate,
                SetPriority,
                SearchableSnapshot,
                Readonly,
                Freeze,
                Unfollow,
            ],
            PhaseKind::Frozen => &[SearchableSnapshot, Unfollow],
            PhaseKind::Delete => &[WaitForSnapshot, Delete],
        }
    }

    /// Whether `action` is allowed in this phase.
    pub fn allows(&self, action: ActionKind) -> bool {
        self.allowed_actions().contains(&action)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Every action name this engine knows, as a closed set.
///
/// Toggle actions have no parameters; their entire semantic is whether they
/// run at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Rollover,
    Allocate,
    Shrink,
    Forcemerge,
    SearchableSnapshot,
    SetPriority,
    WaitForSnapshot,
    Delete,
    Readonly,
    Freeze,
    Unfollow,
}

impl ActionKind {
    /// All action kinds.
    pub fn all() -> &'static [ActionKind] {
        use ActionKind::*;
        &[
            Rollover,
            Allocate,
            Shrink,
            Forcemerge,
            SearchableSnapshot,
            SetPriority,
            WaitForSnapshot,
            Delete,
            Readonly,
            Freeze,
            Unfollow,
        ]
    }

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Rollover => "rollover",
            ActionKind::Allocate => "allocate",
            ActionKind::Shrink => "shrink",
            ActionKind::Forcemerge => "forcemerge",
            ActionKind::SearchableSnapshot => "searchable_snapshot",
            ActionKind::SetPriority => "set_priority",
            ActionKind::WaitForSnapshot => "wait_for_snapshot",
            ActionKind::Delete => "delete",
            ActionKind::Readonly => "readonly",
            ActionKind::Freeze => "freeze",
            ActionKind::Unfollow => "unfollow",
        }
    }

    /// Parse a wire action name.
    pub fn from_name(name: &str) -> Option<ActionKind> {
        ActionKind::all().iter().copied().find(|a| a.name() == name)
    }

    /// Whether this action is a presence/absence toggle.
    pub fn is_toggle(&self) -> bool {
        matches!(
            self,
            ActionKind::Readonly | ActionKind::Freeze | ActionKind::Unfollow
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
