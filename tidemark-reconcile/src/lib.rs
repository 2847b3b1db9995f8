//! # tidemark-reconcile
//!
//! The reconciliation engine: conflict guard, settings differ, snapshot
//! store, remote-store seams, and the pipeline that composes them.
//!
//! Call [`pipeline::apply_cluster`]/[`pipeline::apply_index`]/
//! [`pipeline::apply_policy`] to reconcile and apply against a store, or the
//! pure [`pipeline::reconcile_cluster`]-family functions and [`plan`] when
//! nothing should be touched.

pub mod diff;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod plan;
pub mod snapshot;
pub mod store;

pub use diff::{ClusterPatch, SettingsPatch};
pub use error::ReconcileError;
pub use pipeline::{
    apply_cluster, apply_index, apply_policy, reconcile_cluster, reconcile_index,
    reconcile_policy, ApplyResult, IndexOutcome, PolicyOutcome, SettingsOutcome,
};
pub use plan::{plan_cluster, plan_policy, PolicyPlan, SettingsPlan};
pub use store::{
    ClusterSettingsStore, InMemoryClusterStore, InMemoryIndexStore, InMemoryPolicyStore,
    IndexSettingsStore, PolicyStore, StoreError,
};
