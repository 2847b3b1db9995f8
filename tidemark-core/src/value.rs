//! Canonical setting values and coercion.
//!
//! The remote store commonly transmits every value as a string regardless of
//! its logical type; locally-declared values arrive already typed. Both go
//! through [`coerce_str`]/[`coerce_json`] so that equality in the differ
//! compares canonical forms, never raw serializations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::types::{SettingName, ValueKind};

/// Canonical typed representation of a setting value.
///
/// Untagged on the wire: `"best_compression"`, `2`, `true`, `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Str(_) => ValueKind::String,
            SettingValue::Int(_) => ValueKind::Int,
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::List(_) => ValueKind::StringList,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => s.fmt(f),
            SettingValue::Int(i) => i.fmt(f),
            SettingValue::Bool(b) => b.fmt(f),
            SettingValue::List(v) => write!(f, "{}", v.join(",")),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Int(i)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(v: Vec<String>) -> Self {
        SettingValue::List(v)
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerce a raw string (the remote store's serialization) to `kind`.
///
/// List keys additionally accept the comma-separated scalar form the remote
/// store emits for them (`"a,b"` → `["a", "b"]`); an empty string is an
/// empty list.
pub fn coerce_str(name: &SettingName, kind: ValueKind, raw: &str) -> Result<SettingValue, ValueError> {
    let mismatch = || ValueError::TypeMismatch {
        name: name.clone(),
        expected: kind,
        raw: raw.to_owned(),
    };
    match kind {
        ValueKind::String => Ok(SettingValue::Str(raw.to_owned())),
        ValueKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(SettingValue::Int)
            .map_err(|_| mismatch()),
        ValueKind::Bool => match raw.trim() {
            "true" => Ok(SettingValue::Bool(true)),
            "false" => Ok(SettingValue::Bool(false)),
            _ => Err(mismatch()),
        },
        ValueKind::StringList => {
            if raw.is_empty() {
                return Ok(SettingValue::List(Vec::new()));
            }
            Ok(SettingValue::List(
                raw.split(',').map(|s| s.trim().to_owned()).collect(),
            ))
        }
    }
}

/// Coerce a JSON value (a locally-declared typed value, or a read-back
/// document) to `kind`.
///
/// Strings recurse through [`coerce_str`] — the remote store serializes
/// integers and booleans as strings. String keys accept numbers and booleans
/// and keep their display form, matching how the store echoes them back.
pub fn coerce_json(
    name: &SettingName,
    kind: ValueKind,
    value: &serde_json::Value,
) -> Result<SettingValue, ValueError> {
    use serde_json::Value;

    let mismatch = || ValueError::TypeMismatch {
        name: name.clone(),
        expected: kind,
        raw: value.to_string(),
    };
    match (kind, value) {
        (_, Value::String(s)) => coerce_str(name, kind, s),
        (ValueKind::Int, Value::Number(n)) => n.as_i64().map(SettingValue::Int).ok_or_else(mismatch),
        (ValueKind::Bool, Value::Bool(b)) => Ok(SettingValue::Bool(*b)),
        (ValueKind::String, Value::Number(n)) => Ok(SettingValue::Str(n.to_string())),
        (ValueKind::String, Value::Bool(b)) => Ok(SettingValue::Str(b.to_string())),
        (ValueKind::StringList, Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    _ => return Err(mismatch()),
                }
            }
            Ok(SettingValue::List(out))
        }
        _ => Err(mismatch()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn name() -> SettingName {
        SettingName::from("k")
    }

    #[rstest]
    #[case(ValueKind::Int, "2", SettingValue::Int(2))]
    #[case(ValueKind::Int, " -7 ", SettingValue::Int(-7))]
    #[case(ValueKind::Bool, "true", SettingValue::Bool(true))]
    #[case(ValueKind::Bool, "false", SettingValue::Bool(false))]
    #[case(ValueKind::String, "10m", SettingValue::Str("10m".into()))]
    #[case(
        ValueKind::StringList,
        "a, b,c",
        SettingValue::List(vec!["a".into(), "b".into(), "c".into()])
    )]
    #[case(ValueKind::StringList, "", SettingValue::List(vec![]))]
    fn coerce_str_accepts(
        #[case] kind: ValueKind,
        #[case] raw: &str,
        #[case] expected: SettingValue,
    ) {
        assert_eq!(coerce_str(&name(), kind, raw).expect("coerce"), expected);
    }

    #[rstest]
    #[case(ValueKind::Int, "ten")]
    #[case(ValueKind::Int, "2.5")]
    #[case(ValueKind::Bool, "yes")]
    #[case(ValueKind::Bool, "TRUE")]
    fn coerce_str_rejects(#[case] kind: ValueKind, #[case] raw: &str) {
        let err = coerce_str(&name(), kind, raw).expect_err("should fail");
        assert!(matches!(err, ValueError::TypeMismatch { .. }));
    }

    #[rstest]
    #[case(ValueKind::Int, json!(2), SettingValue::Int(2))]
    #[case(ValueKind::Int, json!("2"), SettingValue::Int(2))]
    #[case(ValueKind::Bool, json!(true), SettingValue::Bool(true))]
    #[case(ValueKind::Bool, json!("false"), SettingValue::Bool(false))]
    #[case(ValueKind::String, json!(5), SettingValue::Str("5".into()))]
    #[case(
        ValueKind::StringList,
        json!(["a", "b"]),
        SettingValue::List(vec!["a".into(), "b".into()])
    )]
    fn coerce_json_accepts(
        #[case] kind: ValueKind,
        #[case] value: serde_json::Value,
        #[case] expected: SettingValue,
    ) {
        assert_eq!(coerce_json(&name(), kind, &value).expect("coerce"), expected);
    }

    #[rstest]
    #[case(ValueKind::Int, json!(2.5))]
    #[case(ValueKind::Bool, json!(1))]
    #[case(ValueKind::StringList, json!([1, 2]))]
    #[case(ValueKind::StringList, json!({"a": 1}))]
    fn coerce_json_rejects(#[case] kind: ValueKind, #[case] value: serde_json::Value) {
        let err = coerce_json(&name(), kind, &value).expect_err("should fail");
        assert!(matches!(err, ValueError::TypeMismatch { .. }));
    }

    #[test]
    fn canonical_equality_across_serializations() {
        let from_store = coerce_str(&name(), ValueKind::Int, "2").expect("store side");
        let declared = coerce_json(&name(), ValueKind::Int, &json!(2)).expect("declared side");
        assert_eq!(from_store, declared);
    }

    #[test]
    fn untagged_serde_roundtrip() {
        for value in [
            SettingValue::Str("best_compression".into()),
            SettingValue::Int(3),
            SettingValue::Bool(false),
            SettingValue::List(vec!["a".into(), "b".into()]),
        ] {
            let json = serde_json::to_string(&value).expect("serialize");
            let back: SettingValue = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn display_forms() {
        assert_eq!(SettingValue::Int(2).to_string(), "2");
        assert_eq!(
            SettingValue::List(vec!["a".into(), "b".into()]).to_string(),
            "a,b"
        );
    }

    #[test]
    fn mismatch_error_names_key_and_kind() {
        let err = coerce_str(&SettingName::from("index.priority"), ValueKind::Int, "high")
            .expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("index.priority"));
        assert!(msg.contains("integer"));
        assert!(msg.contains("high"));
    }
}
