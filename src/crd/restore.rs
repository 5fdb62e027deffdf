//! VirtualMachineRestore resource declaration
//!
//! A restore operation (`harvesterhci.io/v1beta1`) linked to a VM through
//! the restore-name annotation. While incomplete it overrides every other
//! lifecycle signal.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a VirtualMachineRestore
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "harvesterhci.io",
    version = "v1beta1",
    kind = "VirtualMachineRestore",
    plural = "virtualmachinerestores",
    status = "VirtualMachineRestoreStatus",
    namespaced,
    printcolumn = r#"{"name":"Target","type":"string","jsonPath":".spec.target.name"}"#,
    printcolumn = r#"{"name":"Complete","type":"boolean","jsonPath":".status.complete"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRestoreSpec {
    /// Name of the backup being restored from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_backup_name: Option<String>,

    /// Namespace of the backup being restored from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_backup_namespace: Option<String>,
}

/// Status reported by the restore controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRestoreStatus {
    /// Whether the restore has finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,

    /// Overall progress percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Per-volume restore records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restores: Vec<VolumeRestore>,
}

/// Restore record for a single volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRestore {
    /// Name of the volume being restored
    #[serde(default)]
    pub volume_name: String,

    /// Progress percentage for this volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl VirtualMachineRestore {
    /// Returns true once the restore controller reports completion
    pub fn is_complete(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.complete)
            .unwrap_or(false)
    }

    /// Returns true when the controller has published any status at all
    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Overall progress percentage, defaulting to 0
    pub fn progress(&self) -> u8 {
        self.status
            .as_ref()
            .and_then(|s| s.progress)
            .unwrap_or(0)
    }

    /// Per-volume restore records (empty when status is absent)
    pub fn volumes(&self) -> &[VolumeRestore] {
        self.status
            .as_ref()
            .map(|s| s.restores.as_slice())
            .unwrap_or(&[])
    }
}
