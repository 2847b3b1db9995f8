//! Action parameter structs and the closed [`Action`] variant set.
//!
//! Every parameter field is `Option<T>`: "not provided" and "provided as
//! zero" stay distinguishable through expansion, flattening, and diffing.
//! The remote wire format cannot tell an omitted field from an unset one,
//! so presence is tracked structurally and `Some(0)` is always emitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::phase::ActionKind;

// ---------------------------------------------------------------------------
// Parameter structs
// ---------------------------------------------------------------------------

/// Rollover thresholds. The remote rolls the resource over when any one of
/// the declared limits is reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rollover {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_docs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_primary_shard_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_primary_shard_docs: Option<i64>,
}

/// Shard allocation rules. A replica count of zero is a legitimate value
/// and survives because presence is explicit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Allocate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_shards_per_node: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shrink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_primary_shard_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Forcemerge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_num_segments: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchableSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_merge_index: Option<bool>,
}

/// Recovery priority. Zero is a legitimate priority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPriority {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitForSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteIndex {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_searchable_snapshot: Option<bool>,
}

/// Sentinel for actions whose entire semantic is presence/absence.
///
/// On the wire an enabled toggle is an empty object; a disabled toggle is
/// absent. In patches, `enabled: false` is the explicit disable instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toggle {
    pub enabled: bool,
}

impl Toggle {
    pub fn on() -> Self {
        Self { enabled: true }
    }

    pub fn off() -> Self {
        Self { enabled: false }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Closed variant set over every action shape.
///
/// The map key ([`ActionKind`]) carries the action's name; `Toggle` is
/// shared by readonly, freeze, and unfollow. Serializes untagged — a patch
/// entry is the bare parameter object (`{"enabled": false}`,
/// `{"max_age": "7d"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Action {
    Rollover(Rollover),
    Allocate(Allocate),
    Shrink(Shrink),
    Forcemerge(Forcemerge),
    SearchableSnapshot(SearchableSnapshot),
    SetPriority(SetPriority),
    WaitForSnapshot(WaitForSnapshot),
    Delete(DeleteIndex),
    Toggle(Toggle),
}

impl Action {
    /// Whether this variant is the right shape for `kind`.
    pub fn matches_kind(&self, kind: ActionKind) -> bool {
        match self {
            Action::Rollover(_) => kind == ActionKind::Rollover,
            Action::Allocate(_) => kind == ActionKind::Allocate,
            Action::Shrink(_) => kind == ActionKind::Shrink,
            Action::Forcemerge(_) => kind == ActionKind::Forcemerge,
            Action::SearchableSnapshot(_) => kind == ActionKind::SearchableSnapshot,
            Action::SetPriority(_) => kind == ActionKind::SetPriority,
            Action::WaitForSnapshot(_) => kind == ActionKind::WaitForSnapshot,
            Action::Delete(_) => kind == ActionKind::Delete,
            Action::Toggle(_) => kind.is_toggle(),
        }
    }

    pub fn as_toggle(&self) -> Option<&Toggle> {
        match self {
            Action::Toggle(t) => Some(t),
            _ => None,
        }
    }

    /// Parse the structured (patch/snapshot) representation of an action
    /// keyed under `kind`. Toggles carry their `enabled` flag here.
    pub fn from_structured(
        kind: ActionKind,
        value: &serde_json::Value,
    ) -> Result<Action, serde_json::Error> {
        if kind.is_toggle() {
            return Ok(Action::Toggle(serde_json::from_value(value.clone())?));
        }
        Action::params_from_value(kind, value)
    }

    /// Parse the wire representation of an action keyed under `kind`.
    /// A toggle's presence on the wire means it is enabled; its body is an
    /// empty object.
    pub fn from_wire(
        kind: ActionKind,
        value: &serde_json::Value,
    ) -> Result<Action, serde_json::Error> {
        if kind.is_toggle() {
            // Reject non-empty toggle bodies so malformed documents surface.
            let _: EmptyObject = serde_json::from_value(value.clone())?;
            return Ok(Action::Toggle(Toggle::on()));
        }
        Action::params_from_value(kind, value)
    }

    fn params_from_value(
        kind: ActionKind,
        value: &serde_json::Value,
    ) -> Result<Action, serde_json::Error> {
        let value = value.clone();
        Ok(match kind {
            ActionKind::Rollover => Action::Rollover(serde_json::from_value(value)?),
            ActionKind::Allocate => Action::Allocate(serde_json::from_value(value)?),
            ActionKind::Shrink => Action::Shrink(serde_json::from_value(value)?),
            ActionKind::Forcemerge => Action::Forcemerge(serde_json::from_value(value)?),
            ActionKind::SearchableSnapshot => {
                Action::SearchableSnapshot(serde_json::from_value(value)?)
            }
            ActionKind::SetPriority => Action::SetPriority(serde_json::from_value(value)?),
            ActionKind::WaitForSnapshot => Action::WaitForSnapshot(serde_json::from_value(value)?),
            ActionKind::Delete => Action::Delete(serde_json::from_value(value)?),
            ActionKind::Readonly | ActionKind::Freeze | ActionKind::Unfollow => {
                Action::Toggle(serde_json::from_value(value)?)
            }
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyObject {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
