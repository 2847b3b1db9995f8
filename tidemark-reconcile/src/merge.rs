//! Conflict guard — within-source shape resolution and cross-source merge.
//!
//! Sources are processed in the fixed [`SourceTag`] order (dedicated fields,
//! then the generic block, then the legacy block) regardless of the order
//! the caller passes them in, so merge results are deterministic. A key
//! declared by two different sources is a conflict; a key re-declared by the
//! same source overwrites.

use std::collections::BTreeMap;

use tidemark_core::types::{DeclaredSource, RawSetting, SettingEntry, SettingName, SourceTag};
use tidemark_core::value::SettingValue;
use tidemark_core::{KeyRegistry, SettingsMap, ValueKind};

use crate::error::ReconcileError;

/// Resolve one raw declaration to its canonical value.
///
/// Shape rules run before coercion: both `value` and `value_list` populated
/// is ambiguous, neither is missing. A value list for a key registered as a
/// scalar kind is a type mismatch.
pub fn resolve_raw(
    source: SourceTag,
    raw: &RawSetting,
    registry: &KeyRegistry,
) -> Result<SettingValue, ReconcileError> {
    let has_value = raw.value.as_deref().is_some_and(|v| !v.is_empty());
    let has_list = raw.value_list.as_ref().is_some_and(|v| !v.is_empty());

    match (has_value, has_list) {
        (true, true) => Err(ReconcileError::AmbiguousValue {
            source,
            name: raw.name.clone(),
        }),
        (false, false) => Err(ReconcileError::MissingValue {
            source,
            name: raw.name.clone(),
        }),
        (true, false) => {
            let value = raw.value.as_deref().unwrap_or_default();
            Ok(registry.coerce_str(&raw.name, value)?)
        }
        (false, true) => {
            let values = raw.value_list.clone().unwrap_or_default();
            match registry.describe(&raw.name).map(|d| d.kind) {
                Some(ValueKind::StringList) | None => Ok(SettingValue::List(values)),
                Some(kind) => Err(tidemark_core::ValueError::TypeMismatch {
                    name: raw.name.clone(),
                    expected: kind,
                    raw: values.join(","),
                }
                .into()),
            }
        }
    }
}

/// Merge all declared sources into one desired map, failing on the first
/// cross-source conflict.
pub fn merge_sources(
    sources: &[DeclaredSource],
    registry: &KeyRegistry,
) -> Result<BTreeMap<SettingName, SettingEntry>, ReconcileError> {
    let mut ordered: Vec<&DeclaredSource> = sources.iter().collect();
    ordered.sort_by_key(|s| s.tag);

    let mut merged: BTreeMap<SettingName, SettingEntry> = BTreeMap::new();
    for source in ordered {
        for raw in &source.settings {
            if let Some(existing) = merged.get(&raw.name) {
                if existing.source != source.tag {
                    return Err(ReconcileError::Conflict {
                        name: raw.name.clone(),
                        first: existing.source,
                        second: source.tag,
                    });
                }
            }
            let value = resolve_raw(source.tag, raw, registry)?;
            merged.insert(
                raw.name.clone(),
                SettingEntry {
                    name: raw.name.clone(),
                    value,
                    source: source.tag,
                },
            );
        }
    }
    Ok(merged)
}

/// Collapse merged entries into a bare settings map for diffing.
pub fn to_settings_map(merged: BTreeMap<SettingName, SettingEntry>) -> SettingsMap {
    merged
        .into_values()
        .map(|entry| (entry.name, entry.value))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> KeyRegistry {
        KeyRegistry::builtin()
    }

    #[test]
    fn two_sources_same_key_conflict_names_both() {
        let sources = vec![
            DeclaredSource::new(SourceTag::GenericBlock)
                .with_setting(RawSetting::scalar("index.number_of_replicas", "2")),
            DeclaredSource::new(SourceTag::DedicatedField)
                .with_setting(RawSetting::scalar("index.number_of_replicas", "1")),
        ];

        let err = merge_sources(&sources, &registry()).expect_err("should conflict");
        match err {
            ReconcileError::Conflict { name, first, second } => {
                assert_eq!(name, SettingName::from("index.number_of_replicas"));
                assert_eq!(first, SourceTag::DedicatedField);
                assert_eq!(second, SourceTag::GenericBlock);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn merge_order_is_fixed_regardless_of_caller_order() {
        // Same sources in both orders; the conflict must always name the
        // dedicated field as first, since it merges first.
        for sources in [
            vec![
                DeclaredSource::new(SourceTag::LegacyBlock)
                    .with_setting(RawSetting::scalar("index.codec", "default")),
                DeclaredSource::new(SourceTag::DedicatedField)
                    .with_setting(RawSetting::scalar("index.codec", "best_compression")),
            ],
            vec![
                DeclaredSource::new(SourceTag::DedicatedField)
                    .with_setting(RawSetting::scalar("index.codec", "best_compression")),
                DeclaredSource::new(SourceTag::LegacyBlock)
                    .with_setting(RawSetting::scalar("index.codec", "default")),
            ],
        ] {
            let err = merge_sources(&sources, &registry()).expect_err("should conflict");
            match err {
                ReconcileError::Conflict { first, second, .. } => {
                    assert_eq!(first, SourceTag::DedicatedField);
                    assert_eq!(second, SourceTag::LegacyBlock);
                }
                other => panic!("expected conflict, got {other:?}"),
            }
        }
    }

    #[test]
    fn same_source_redeclaration_overwrites() {
        let sources = vec![DeclaredSource::new(SourceTag::GenericBlock)
            .with_setting(RawSetting::scalar("index.priority", "10"))
            .with_setting(RawSetting::scalar("index.priority", "20"))];

        let merged = merge_sources(&sources, &registry()).expect("merge");
        let entry = merged
            .get(&SettingName::from("index.priority"))
            .expect("entry");
        assert_eq!(entry.value, SettingValue::Int(20));
    }

    #[test]
    fn both_value_and_list_is_ambiguous() {
        let raw = RawSetting {
            name: SettingName::from("index.query.default_field"),
            value: Some("message".into()),
            value_list: Some(vec!["message".into(), "host".into()]),
        };
        let err = resolve_raw(SourceTag::GenericBlock, &raw, &registry()).expect_err("should fail");
        assert!(matches!(err, ReconcileError::AmbiguousValue { .. }));
    }

    #[test]
    fn neither_value_nor_list_is_missing() {
        let raw = RawSetting {
            name: SettingName::from("index.priority"),
            value: None,
            value_list: Some(vec![]),
        };
        let err = resolve_raw(SourceTag::LegacyBlock, &raw, &registry()).expect_err("should fail");
        match err {
            ReconcileError::MissingValue { source, name } => {
                assert_eq!(source, SourceTag::LegacyBlock);
                assert_eq!(name, SettingName::from("index.priority"));
            }
            other => panic!("expected missing value, got {other:?}"),
        }
    }

    #[test]
    fn ambiguity_is_detected_before_cross_source_merge() {
        // The ambiguous declaration sits in the legacy block; the conflict
        // with the dedicated field must not win the race.
        let sources = vec![
            DeclaredSource::new(SourceTag::LegacyBlock).with_setting(RawSetting {
                name: SettingName::from("index.sort.field"),
                value: Some("timestamp".into()),
                value_list: Some(vec!["timestamp".into()]),
            }),
            DeclaredSource::new(SourceTag::DedicatedField)
                .with_setting(RawSetting::list("index.sort.field", ["timestamp"])),
        ];
        let err = merge_sources(&sources, &registry()).expect_err("should fail");
        assert!(matches!(err, ReconcileError::AmbiguousValue { .. }));
    }

    #[test]
    fn value_list_for_scalar_key_is_type_mismatch() {
        let raw = RawSetting::list("index.number_of_replicas", ["1", "2"]);
        let err = resolve_raw(SourceTag::GenericBlock, &raw, &registry()).expect_err("should fail");
        assert!(matches!(err, ReconcileError::Value(_)));
    }

    #[test]
    fn merged_values_are_canonical() {
        let sources = vec![
            DeclaredSource::new(SourceTag::DedicatedField)
                .with_setting(RawSetting::scalar("index.number_of_replicas", "2")),
            DeclaredSource::new(SourceTag::GenericBlock)
                .with_setting(RawSetting::scalar("index.refresh_interval", "30s")),
        ];
        let map = to_settings_map(merge_sources(&sources, &registry()).expect("merge"));
        assert_eq!(
            map.get(&SettingName::from("index.number_of_replicas")),
            Some(&SettingValue::Int(2))
        );
        assert_eq!(
            map.get(&SettingName::from("index.refresh_interval")),
            Some(&SettingValue::Str("30s".into()))
        );
    }
}
