//! VirtualMachine resource declaration
//!
//! A typed projection of the `kubevirt.io/v1` VirtualMachine, restricted to
//! the fields the status engine reads: desired state (run strategy, explicit
//! run flag), reported status (conditions, printable status, created flag,
//! pending state-change requests), and the template volumes that carry
//! cloud-init network data.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    find_condition, Condition, ConditionStatus, RunStrategy, StateChangeRequest,
    CONDITION_FAILURE, CONDITION_RESTART_REQUIRED,
};

/// Annotation linking a VM to the restore operation that created it
pub const ANNOTATION_RESTORE_NAME: &str = "restore.harvesterhci.io/name";
/// Annotation carrying an insufficient-resource-quota warning for display
pub const ANNOTATION_INSUFFICIENT_RESOURCE_QUOTA: &str =
    "harvesterhci.io/insufficient-resource-quota";
/// Annotation with JSON-encoded device allocation details (vGPUs etc.)
pub const ANNOTATION_DEVICE_ALLOCATION_DETAILS: &str = "harvesterhci.io/deviceAllocationDetails";

/// Specification for a VirtualMachine
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachine",
    plural = "virtualmachines",
    shortname = "vm",
    status = "VirtualMachineStatus",
    namespaced,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.printableStatus"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    /// Explicit run flag; when set it overrides the run strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    /// Declarative run policy (Always, RerunOnFailure, Halted, Manual)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_strategy: Option<RunStrategy>,

    /// Instance template; only the volume list is projected here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<InstanceTemplate>,
}

/// Template for the instance a VM stamps out
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTemplate {
    /// Template spec holding the volume list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<InstanceTemplateSpec>,
}

/// The subset of the instance template spec the engine reads
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTemplateSpec {
    /// Volumes attached to the instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// A single template volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    #[serde(default)]
    pub name: String,

    /// Inline cloud-init payload, when this volume carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_init_no_cloud: Option<CloudInitNoCloud>,
}

/// Inline cloud-init NoCloud source
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudInitNoCloud {
    /// Network configuration document (YAML text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_data: Option<String>,
}

/// Status reported by the VM controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    /// Whether the runtime instance has been created
    #[serde(default)]
    pub created: bool,

    /// Coarse free-text status (e.g. "Starting", "Running", "ErrorUnschedulable")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printable_status: Option<String>,

    /// Conditions reported for the VM itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Pending start/stop requests not yet acted upon
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_change_requests: Vec<StateChangeRequest>,
}

impl VirtualMachineStatus {
    /// Set the created flag and return self for chaining
    pub fn created(mut self, created: bool) -> Self {
        self.created = created;
        self
    }

    /// Set the printable status and return self for chaining
    pub fn printable_status(mut self, status: impl Into<String>) -> Self {
        self.printable_status = Some(status.into());
        self
    }

    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        // Replace any existing condition of the same type
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }

    /// Add a pending state-change request and return self for chaining
    pub fn state_change_request(mut self, request: StateChangeRequest) -> Self {
        self.state_change_requests.push(request);
        self
    }
}

/// Decoded `gpus` section of the device-allocation annotation
#[derive(Clone, Debug, Default, Deserialize)]
struct DeviceAllocationDetails {
    #[serde(default)]
    gpus: BTreeMap<String, Vec<String>>,
}

impl VirtualMachine {
    /// Explicit run flag from the spec, when set
    pub fn running(&self) -> Option<bool> {
        self.spec.running
    }

    /// Declared run strategy, when set
    pub fn run_strategy(&self) -> Option<&RunStrategy> {
        self.spec.run_strategy.as_ref()
    }

    /// Whether the runtime instance has ever been created
    pub fn is_created(&self) -> bool {
        self.status.as_ref().map(|s| s.created).unwrap_or(false)
    }

    /// Coarse printable status string, when reported
    pub fn printable_status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.printable_status.as_deref())
    }

    /// Conditions reported for the VM (empty when status is absent)
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    /// Pending start/stop requests (empty when status is absent)
    pub fn state_change_requests(&self) -> &[StateChangeRequest] {
        self.status
            .as_ref()
            .map(|s| s.state_change_requests.as_slice())
            .unwrap_or(&[])
    }

    /// The VM-level Failure condition, when present
    pub fn failure_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_FAILURE)
    }

    /// Returns true when a spec change is waiting on a restart
    pub fn restart_required(&self) -> bool {
        find_condition(self.conditions(), CONDITION_RESTART_REQUIRED)
            .map(|c| c.status == ConditionStatus::True)
            .unwrap_or(false)
    }

    /// Returns true once deletion has been requested
    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Annotation value by key
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    /// Name of the restore operation linked to this VM, if any
    pub fn restore_name(&self) -> Option<&str> {
        self.annotation(ANNOTATION_RESTORE_NAME)
    }

    /// Insufficient-resource-quota warning text, if the annotation is set
    pub fn insufficient_resource_message(&self) -> Option<&str> {
        self.annotation(ANNOTATION_INSUFFICIENT_RESOURCE_QUOTA)
    }

    /// vGPU allocations decoded from the device-allocation annotation
    ///
    /// Decoding fails closed: a missing or malformed annotation yields an
    /// empty map.
    pub fn provisioned_vgpus(&self) -> BTreeMap<String, Vec<String>> {
        let raw = self
            .annotation(ANNOTATION_DEVICE_ALLOCATION_DETAILS)
            .unwrap_or("{}");

        serde_json::from_str::<DeviceAllocationDetails>(raw)
            .map(|d| d.gpus)
            .unwrap_or_default()
    }

    /// IP addresses declared in the cloud-init network configuration
    ///
    /// Reads the network data of the last volume carrying a cloud-init
    /// payload and collects `config[].subnets[].address`. Any parse failure
    /// yields an empty list.
    pub fn network_ips(&self) -> Vec<String> {
        let volumes = self
            .spec
            .template
            .as_ref()
            .and_then(|t| t.spec.as_ref())
            .map(|s| s.volumes.as_slice())
            .unwrap_or(&[]);

        // Later cloud-init volumes shadow earlier ones, even when their
        // network data is absent.
        let mut network_data: Option<&str> = None;
        for volume in volumes {
            if let Some(cloud_init) = &volume.cloud_init_no_cloud {
                network_data = cloud_init.network_data.as_deref();
            }
        }

        let Some(text) = network_data else {
            return Vec::new();
        };
        let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(text) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let entries = doc
            .get("config")
            .and_then(|c| c.as_sequence())
            .map(|s| s.as_slice())
            .unwrap_or(&[]);
        for entry in entries {
            let subnets = entry
                .get("subnets")
                .and_then(|s| s.as_sequence())
                .map(|s| s.as_slice())
                .unwrap_or(&[]);
            for subnet in subnets {
                if let Some(address) = subnet.get("address").and_then(|a| a.as_str()) {
                    out.push(address.to_string());
                }
            }
        }
        out
    }
}
