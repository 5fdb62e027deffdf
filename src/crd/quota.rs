//! ResourceQuota resource declaration
//!
//! Namespace-scoped quota (`harvesterhci.io/v1beta1`) carrying per-VM
//! snapshot size limits. The engine only performs the keyed lookup.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a ResourceQuota
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "harvesterhci.io",
    version = "v1beta1",
    kind = "ResourceQuota",
    plural = "resourcequotas",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuotaSpec {
    /// Snapshot size limits for this namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_limit: Option<SnapshotLimit>,
}

/// Snapshot limits section of the quota spec
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLimit {
    /// Total snapshot size quota in bytes, keyed by VM name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vm_total_snapshot_size_quota: BTreeMap<String, i64>,
}

impl ResourceQuota {
    /// Snapshot size quota in bytes for the named VM, when one is set
    pub fn snapshot_size_quota(&self, vm_name: &str) -> Option<i64> {
        self.spec
            .snapshot_limit
            .as_ref()
            .and_then(|l| l.vm_total_snapshot_size_quota.get(vm_name))
            .copied()
    }
}
