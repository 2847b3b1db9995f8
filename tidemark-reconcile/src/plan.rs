//! Dry-run plan support — patch plus unified-diff preview.
//!
//! No store is touched and no snapshot is written; a plan is pure
//! computation over the previous document and the declared sources.

use similar::TextDiff;

use tidemark_core::types::{DeclaredSource, SettingsDocument};
use tidemark_core::KeyRegistry;
use tidemark_lifecycle::{PolicyDocument, PolicyPatch};

use crate::diff::ClusterPatch;
use crate::error::ReconcileError;
use crate::pipeline::{reconcile_cluster, reconcile_policy};

/// Plan for a cluster settings reconciliation.
#[derive(Debug)]
pub struct SettingsPlan {
    pub resource: String,
    pub patch: ClusterPatch,
    pub merged: SettingsDocument,
    /// Unified diff of previous vs desired document; `None` when nothing
    /// would change.
    pub preview: Option<String>,
}

/// Plan for a lifecycle policy reconciliation.
#[derive(Debug)]
pub struct PolicyPlan {
    pub resource: String,
    pub patch: PolicyPatch,
    pub merged: PolicyDocument,
    pub preview: Option<String>,
}

/// Compute what applying the declared cluster settings would change.
pub fn plan_cluster(
    resource: &str,
    previous: Option<&SettingsDocument>,
    persistent_sources: &[DeclaredSource],
    transient_sources: &[DeclaredSource],
    registry: &KeyRegistry,
) -> Result<SettingsPlan, ReconcileError> {
    let (patch, merged) =
        reconcile_cluster(previous, persistent_sources, transient_sources, registry)?;

    let preview = if patch.is_empty() {
        None
    } else {
        let empty = SettingsDocument::default();
        Some(render_preview(
            resource,
            previous.unwrap_or(&empty),
            &merged,
        )?)
    };

    Ok(SettingsPlan {
        resource: resource.to_owned(),
        patch,
        merged,
        preview,
    })
}

/// Compute what applying the declared policy would change.
pub fn plan_policy(
    resource: &str,
    previous: Option<&PolicyDocument>,
    desired: &PolicyDocument,
) -> Result<PolicyPlan, ReconcileError> {
    let (patch, merged) = reconcile_policy(previous, desired)?;

    let preview = if patch.is_empty() {
        None
    } else {
        let empty = PolicyDocument::new();
        Some(render_preview(
            resource,
            previous.unwrap_or(&empty),
            &merged,
        )?)
    };

    Ok(PolicyPlan {
        resource: resource.to_owned(),
        patch,
        merged,
        preview,
    })
}

fn render_preview<T: serde::Serialize>(
    resource: &str,
    previous: &T,
    desired: &T,
) -> Result<String, ReconcileError> {
    let old = format!("{}\n", serde_json::to_string_pretty(previous)?);
    let new = format!("{}\n", serde_json::to_string_pretty(desired)?);

    let old_header = format!("a/{resource}");
    let new_header = format!("b/{resource}");
    Ok(TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
