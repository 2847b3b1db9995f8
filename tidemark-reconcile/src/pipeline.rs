//! Reconciliation pipeline — pure entry points plus the snapshot-gated
//! apply flow used against a store.
//!
//! ## Apply protocol
//!
//! 1. Load the snapshot (`None` = first apply).
//! 2. Conflict-guard and merge the declared sources.
//! 3. Diff previous vs desired → patch.
//! 4. Empty patch → skip the store entirely.
//! 5. Dry-run → report what would change, touch nothing.
//! 6. Otherwise send the patch; persist the merged document as the new
//!    snapshot only after the store accepts. A rejected patch leaves the
//!    snapshot untouched so believed and actual remote state cannot drift.

use std::path::Path;

use tidemark_core::types::{DeclaredSource, SettingsDocument};
use tidemark_core::{KeyRegistry, SettingsMap};
use tidemark_lifecycle::{self as lifecycle, PolicyDocument, PolicyPatch};

use crate::diff::{diff, diff_document, ClusterPatch, SettingsPatch};
use crate::error::ReconcileError;
use crate::merge::{merge_sources, to_settings_map};
use crate::snapshot;
use crate::store::{ClusterSettingsStore, IndexSettingsStore, PolicyStore};

// ---------------------------------------------------------------------------
// Apply result
// ---------------------------------------------------------------------------

/// Outcome of an individual apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// The patch was sent and the snapshot advanced.
    Applied,
    /// Previous and desired state already agree; the store was not called.
    Unchanged,
    /// Dry-run mode: the patch *would* have been sent.
    WouldApply,
}

/// Outcome of reconciling cluster settings.
#[derive(Debug)]
pub struct SettingsOutcome {
    pub resource: String,
    pub patch: ClusterPatch,
    pub result: ApplyResult,
}

/// Outcome of reconciling one index's settings.
#[derive(Debug)]
pub struct IndexOutcome {
    pub resource: String,
    pub patch: SettingsPatch,
    pub result: ApplyResult,
}

/// Outcome of reconciling a lifecycle policy.
#[derive(Debug)]
pub struct PolicyOutcome {
    pub resource: String,
    pub patch: PolicyPatch,
    pub result: ApplyResult,
}

// ---------------------------------------------------------------------------
// Pure reconciliation
// ---------------------------------------------------------------------------

/// Reconcile cluster settings: conflict-guard each collection's sources,
/// merge, and diff against the previously-applied document.
///
/// `previous == None` signals the first-ever apply. Returns the patch and
/// the merged document to persist as the next snapshot.
pub fn reconcile_cluster(
    previous: Option<&SettingsDocument>,
    persistent_sources: &[DeclaredSource],
    transient_sources: &[DeclaredSource],
    registry: &KeyRegistry,
) -> Result<(ClusterPatch, SettingsDocument), ReconcileError> {
    let first_apply = previous.is_none();
    let empty = SettingsDocument::default();
    let previous = previous.unwrap_or(&empty);

    let desired = SettingsDocument {
        persistent: to_settings_map(merge_sources(persistent_sources, registry)?),
        transient: to_settings_map(merge_sources(transient_sources, registry)?),
    };

    let patch = diff_document(previous, &desired, registry, first_apply)?;
    Ok((patch, desired))
}

/// Reconcile one index's flat settings.
pub fn reconcile_index(
    previous: Option<&SettingsMap>,
    sources: &[DeclaredSource],
    registry: &KeyRegistry,
) -> Result<(SettingsPatch, SettingsMap), ReconcileError> {
    let first_apply = previous.is_none();
    let empty = SettingsMap::new();
    let previous = previous.unwrap_or(&empty);

    let desired = to_settings_map(merge_sources(sources, registry)?);
    let patch = diff(previous, &desired, registry, first_apply)?;
    Ok((patch, desired))
}

/// Reconcile a lifecycle policy against the previously-declared document.
pub fn reconcile_policy(
    previous: Option<&PolicyDocument>,
    desired: &PolicyDocument,
) -> Result<(PolicyPatch, PolicyDocument), ReconcileError> {
    let empty = PolicyDocument::new();
    let previous = previous.unwrap_or(&empty);
    let patch = lifecycle::diff(previous, desired)?;
    Ok((patch, desired.clone()))
}

// ---------------------------------------------------------------------------
// Snapshot-gated apply
// ---------------------------------------------------------------------------

/// Reconcile and apply cluster settings against `store`.
pub fn apply_cluster(
    store: &mut dyn ClusterSettingsStore,
    home: &Path,
    resource: &str,
    persistent_sources: &[DeclaredSource],
    transient_sources: &[DeclaredSource],
    registry: &KeyRegistry,
    dry_run: bool,
) -> Result<SettingsOutcome, ReconcileError> {
    let previous = snapshot::load_at::<SettingsDocument>(home, resource)?.map(|s| s.document);
    let (patch, merged) = reconcile_cluster(
        previous.as_ref(),
        persistent_sources,
        transient_sources,
        registry,
    )?;

    let result = finish_apply(resource, patch.is_empty(), dry_run, || {
        store.apply(&patch)?;
        Ok(())
    })?;
    if result == ApplyResult::Applied {
        snapshot::save_at(home, resource, merged)?;
    }

    Ok(SettingsOutcome {
        resource: resource.to_owned(),
        patch,
        result,
    })
}

/// Reconcile and apply one index's settings against `store`.
pub fn apply_index(
    store: &mut dyn IndexSettingsStore,
    home: &Path,
    index: &str,
    sources: &[DeclaredSource],
    registry: &KeyRegistry,
    dry_run: bool,
) -> Result<IndexOutcome, ReconcileError> {
    let previous = snapshot::load_at::<SettingsMap>(home, index)?.map(|s| s.document);
    let (patch, merged) = reconcile_index(previous.as_ref(), sources, registry)?;

    let result = finish_apply(index, patch.is_empty(), dry_run, || {
        store.apply(index, &patch)?;
        Ok(())
    })?;
    if result == ApplyResult::Applied {
        snapshot::save_at(home, index, merged)?;
    }

    Ok(IndexOutcome {
        resource: index.to_owned(),
        patch,
        result,
    })
}

/// Reconcile and apply a lifecycle policy against `store`.
pub fn apply_policy(
    store: &mut dyn PolicyStore,
    home: &Path,
    name: &str,
    desired: &PolicyDocument,
    dry_run: bool,
) -> Result<PolicyOutcome, ReconcileError> {
    let previous = snapshot::load_at::<PolicyDocument>(home, name)?.map(|s| s.document);
    let (patch, merged) = reconcile_policy(previous.as_ref(), desired)?;

    let result = finish_apply(name, patch.is_empty(), dry_run, || {
        store.apply(name, &patch)?;
        Ok(())
    })?;
    if result == ApplyResult::Applied {
        snapshot::save_at(home, name, merged)?;
    }

    Ok(PolicyOutcome {
        resource: name.to_owned(),
        patch,
        result,
    })
}

fn finish_apply(
    resource: &str,
    patch_is_empty: bool,
    dry_run: bool,
    send: impl FnOnce() -> Result<(), ReconcileError>,
) -> Result<ApplyResult, ReconcileError> {
    if patch_is_empty {
        tracing::debug!("unchanged: {resource}");
        return Ok(ApplyResult::Unchanged);
    }
    if dry_run {
        tracing::info!("[dry-run] would apply: {resource}");
        return Ok(ApplyResult::WouldApply);
    }
    send()?;
    tracing::info!("applied: {resource}");
    Ok(ApplyResult::Applied)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use tidemark_core::types::{RawSetting, SettingName, SourceTag};
    use tidemark_core::value::SettingValue;
    use tidemark_lifecycle::{
        Action, ActionKind, PhaseDefinition, PhaseKind, Rollover, Toggle,
    };

    use crate::store::{InMemoryClusterStore, InMemoryIndexStore, InMemoryPolicyStore};

    use super::*;

    fn registry() -> KeyRegistry {
        KeyRegistry::builtin()
    }

    fn poll_interval_source(value: &str) -> Vec<DeclaredSource> {
        vec![DeclaredSource::new(SourceTag::DedicatedField)
            .with_setting(RawSetting::scalar("indices.lifecycle.poll_interval", value))]
    }

    #[test]
    fn poll_interval_change_patches_persistent_collection() {
        let mut previous = SettingsDocument::default();
        previous.persistent.insert(
            SettingName::from("indices.lifecycle.poll_interval"),
            SettingValue::from("10m"),
        );

        let (patch, merged) = reconcile_cluster(
            Some(&previous),
            &poll_interval_source("15m"),
            &[],
            &registry(),
        )
        .expect("reconcile");

        assert_eq!(
            serde_json::to_value(&patch).expect("serialize"),
            json!({"persistent": {"indices.lifecycle.poll_interval": "15m"}})
        );
        assert_eq!(
            merged.persistent.get(&SettingName::from("indices.lifecycle.poll_interval")),
            Some(&SettingValue::from("15m"))
        );
    }

    #[test]
    fn empty_desired_tears_down_previous_state() {
        let mut previous = SettingsDocument::default();
        previous
            .persistent
            .insert(SettingName::from("a"), SettingValue::from("1"));
        previous
            .persistent
            .insert(SettingName::from("b"), SettingValue::from("2"));

        let (patch, merged) =
            reconcile_cluster(Some(&previous), &[], &[], &registry()).expect("reconcile");

        assert_eq!(
            serde_json::to_value(&patch).expect("serialize"),
            json!({"persistent": {"a": null, "b": null}})
        );
        assert!(merged.is_empty());
    }

    #[test]
    fn conflicting_sources_abort_reconciliation() {
        let sources = vec![
            DeclaredSource::new(SourceTag::DedicatedField)
                .with_setting(RawSetting::scalar("index.priority", "10")),
            DeclaredSource::new(SourceTag::LegacyBlock)
                .with_setting(RawSetting::scalar("index.priority", "20")),
        ];
        let err = reconcile_index(None, &sources, &registry()).expect_err("should conflict");
        assert!(matches!(err, ReconcileError::Conflict { .. }));
    }

    #[test]
    fn apply_then_reapply_converges_to_unchanged() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryClusterStore::new();
        let sources = poll_interval_source("15m");

        let first = apply_cluster(
            &mut store,
            home.path(),
            "search-cluster",
            &sources,
            &[],
            &registry(),
            false,
        )
        .expect("first apply");
        assert_eq!(first.result, ApplyResult::Applied);

        let second = apply_cluster(
            &mut store,
            home.path(),
            "search-cluster",
            &sources,
            &[],
            &registry(),
            false,
        )
        .expect("second apply");
        assert_eq!(second.result, ApplyResult::Unchanged);
        assert!(second.patch.is_empty());
    }

    #[test]
    fn dry_run_touches_neither_store_nor_snapshot() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryClusterStore::new();

        let outcome = apply_cluster(
            &mut store,
            home.path(),
            "search-cluster",
            &poll_interval_source("15m"),
            &[],
            &registry(),
            true,
        )
        .expect("dry run");

        assert_eq!(outcome.result, ApplyResult::WouldApply);
        assert!(store.fetch().expect("fetch").is_empty(), "store must be untouched");
        let snap = snapshot::load_at::<SettingsDocument>(home.path(), "search-cluster")
            .expect("load");
        assert!(snap.is_none(), "dry-run must not write a snapshot");
    }

    #[test]
    fn rejected_patch_does_not_advance_snapshot() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryClusterStore::new();
        let sources = poll_interval_source("15m");

        apply_cluster(
            &mut store,
            home.path(),
            "search-cluster",
            &sources,
            &[],
            &registry(),
            false,
        )
        .expect("seed apply");

        store.reject_next("settings endpoint briefly read-only");
        let err = apply_cluster(
            &mut store,
            home.path(),
            "search-cluster",
            &poll_interval_source("30m"),
            &[],
            &registry(),
            false,
        )
        .expect_err("store rejection surfaces");
        assert!(matches!(err, ReconcileError::Store(_)));

        // The snapshot still holds the last successful apply, so retrying
        // the same change produces the same patch.
        let snap = snapshot::load_at::<SettingsDocument>(home.path(), "search-cluster")
            .expect("load")
            .expect("snapshot");
        assert_eq!(
            snap.document.persistent.get(&SettingName::from("indices.lifecycle.poll_interval")),
            Some(&SettingValue::from("15m"))
        );
    }

    #[test]
    fn first_apply_allows_static_keys_later_applies_reject_changes() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryIndexStore::new();
        let shards = |n: &str| {
            vec![DeclaredSource::new(SourceTag::DedicatedField)
                .with_setting(RawSetting::scalar("index.number_of_shards", n))]
        };

        let first = apply_index(
            &mut store,
            home.path(),
            "logs-2026",
            &shards("3"),
            &registry(),
            false,
        )
        .expect("first apply");
        assert_eq!(first.result, ApplyResult::Applied);

        let err = apply_index(
            &mut store,
            home.path(),
            "logs-2026",
            &shards("5"),
            &registry(),
            false,
        )
        .expect_err("static change must fail");
        assert!(matches!(err, ReconcileError::ImmutableSetting { .. }));
    }

    #[test]
    fn policy_apply_synthesizes_toggle_disable_on_second_run() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryPolicyStore::new();

        let with_readonly = PolicyDocument::new().with_phase(
            PhaseKind::Hot,
            PhaseDefinition::new()
                .with_action(
                    ActionKind::Rollover,
                    Action::Rollover(Rollover {
                        max_age: Some("30d".into()),
                        ..Rollover::default()
                    }),
                )
                .with_action(ActionKind::Readonly, Action::Toggle(Toggle::on())),
        );
        let without_readonly = PolicyDocument::new().with_phase(
            PhaseKind::Hot,
            PhaseDefinition::new().with_action(
                ActionKind::Rollover,
                Action::Rollover(Rollover {
                    max_age: Some("30d".into()),
                    ..Rollover::default()
                }),
            ),
        );

        let first = apply_policy(&mut store, home.path(), "logs-policy", &with_readonly, false)
            .expect("first apply");
        assert_eq!(first.result, ApplyResult::Applied);
        let wire = store.fetch("logs-policy").expect("fetch").expect("policy");
        assert!(wire.phases["hot"].actions.contains_key("readonly"));

        let second =
            apply_policy(&mut store, home.path(), "logs-policy", &without_readonly, false)
                .expect("second apply");
        assert_eq!(second.result, ApplyResult::Applied);
        let hot_patch = second
            .patch
            .phases
            .get(&PhaseKind::Hot)
            .expect("hot slot")
            .as_ref()
            .expect("phase patch");
        assert_eq!(
            hot_patch.actions.get(&ActionKind::Readonly),
            Some(&Some(Action::Toggle(Toggle::off())))
        );

        // The store materialized the disable by dropping the wire action.
        let wire = store.fetch("logs-policy").expect("fetch").expect("policy");
        assert!(!wire.phases["hot"].actions.contains_key("readonly"));

        // And the engine has converged.
        let third =
            apply_policy(&mut store, home.path(), "logs-policy", &without_readonly, false)
                .expect("third apply");
        assert_eq!(third.result, ApplyResult::Unchanged);
    }

    #[test]
    fn policy_validation_error_propagates_before_any_store_call() {
        let home = TempDir::new().expect("home");
        let mut store = InMemoryPolicyStore::new();
        let invalid = PolicyDocument::new().with_phase(
            PhaseKind::Frozen,
            PhaseDefinition::new().with_action(
                ActionKind::Rollover,
                Action::Rollover(Rollover::default()),
            ),
        );

        let err = apply_policy(&mut store, home.path(), "bad-policy", &invalid, false)
            .expect_err("should fail");
        assert!(matches!(err, ReconcileError::Policy(_)));
        assert!(store.fetch("bad-policy").expect("fetch").is_none());
    }
}
