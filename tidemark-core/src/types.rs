//! Domain types for the Tidemark reconciliation engine.
//!
//! Setting names are newtyped; never pass bare `String`s across crate
//! boundaries. All types are serializable/deserializable via serde.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::SettingValue;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name of a remote setting key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SettingName(pub String);

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SettingName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SettingName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which part of the declared configuration supplied a setting's value.
///
/// The derived `Ord` is the fixed merge order: dedicated fields first, then
/// the generic settings block, then the deprecated legacy block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    DedicatedField,
    GenericBlock,
    LegacyBlock,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::DedicatedField => write!(f, "dedicated field"),
            SourceTag::GenericBlock => write!(f, "settings block"),
            SourceTag::LegacyBlock => write!(f, "legacy settings block"),
        }
    }
}

// `SourceTag` is carried as the `source` field of several `ReconcileError`
// variants. `thiserror` treats a field named `source` as the error's cause and
// therefore requires it to implement `std::error::Error`; the default methods
// suffice since the tag is a leaf value.
impl std::error::Error for SourceTag {}

/// The logical value shape a setting key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Int,
    Bool,
    StringList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Int => write!(f, "integer"),
            ValueKind::Bool => write!(f, "boolean"),
            ValueKind::StringList => write!(f, "string list"),
        }
    }
}

/// Whether a key may change after the resource has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// May only be supplied at resource creation.
    Static,
    /// May be changed at any time.
    Dynamic,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutability::Static => write!(f, "static"),
            Mutability::Dynamic => write!(f, "dynamic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Registry entry describing one known setting key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub name: SettingName,
    pub kind: ValueKind,
    pub mutability: Mutability,
}

impl KeyDescriptor {
    pub fn new(name: impl Into<SettingName>, kind: ValueKind, mutability: Mutability) -> Self {
        Self {
            name: name.into(),
            kind,
            mutability,
        }
    }
}

/// One declared setting before shape resolution.
///
/// `value` and `value_list` are mutually exclusive by construction; exactly
/// one of them must be non-empty. Both populated is an ambiguity error,
/// neither is a missing-value error — enforced by the conflict guard, not
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSetting {
    pub name: SettingName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_list: Option<Vec<String>>,
}

impl RawSetting {
    /// A scalar declaration.
    pub fn scalar(name: impl Into<SettingName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_list: None,
        }
    }

    /// An ordered-list declaration.
    pub fn list<I, S>(name: impl Into<SettingName>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: None,
            value_list: Some(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// One source's declared settings for a single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredSource {
    pub tag: SourceTag,
    #[serde(default)]
    pub settings: Vec<RawSetting>,
}

impl DeclaredSource {
    pub fn new(tag: SourceTag) -> Self {
        Self {
            tag,
            settings: Vec::new(),
        }
    }

    pub fn with_setting(mut self, setting: RawSetting) -> Self {
        self.settings.push(setting);
        self
    }
}

/// A merged, coerced setting attributed to the source that declared it.
///
/// Invariant: across one reconciliation pass at most one entry exists per
/// name; the conflict guard rejects competing sources before this type is
/// ever produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub name: SettingName,
    pub value: SettingValue,
    pub source: SourceTag,
}

/// One flat collection of canonical settings.
pub type SettingsMap = BTreeMap<SettingName, SettingValue>;

/// A cluster-scoped settings document: two independently-diffed collections.
///
/// Index-scoped callers use a bare [`SettingsMap`] instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub persistent: SettingsMap,
    #[serde(default)]
    pub transient: SettingsMap,
}

impl SettingsDocument {
    pub fn is_empty(&self) -> bool {
        self.persistent.is_empty() && self.transient.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
