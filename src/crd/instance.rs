//! VirtualMachineInstance resource declaration
//!
//! The live runtime counterpart of a VirtualMachine (`kubevirt.io/v1`),
//! sharing its namespace/name. Only the status fields the engine reads are
//! projected: phase, conditions, migration state, and node placement.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    condition_is_true, find_condition, Condition, InstancePhase, MigrationState,
    CONDITION_AGENT_CONNECTED, CONDITION_FAILURE, CONDITION_PAUSED, CONDITION_READY,
};

/// Specification for a VirtualMachineInstance
///
/// The engine never reads the instance spec; the declaration exists so the
/// watcher can decode the resource.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachineInstance",
    plural = "virtualmachineinstances",
    shortname = "vmi",
    status = "VirtualMachineInstanceStatus",
    namespaced,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Node","type":"string","jsonPath":".status.nodeName"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceSpec {}

/// Status reported by the instance controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceStatus {
    /// Current lifecycle phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<InstancePhase>,

    /// Conditions reported for the instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Live migration state, present while a migration is tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_state: Option<MigrationState>,

    /// Node the instance is placed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl VirtualMachineInstanceStatus {
    /// Set the phase and return self for chaining
    pub fn phase(mut self, phase: InstancePhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }

    /// Set the migration state and return self for chaining
    pub fn migration_state(mut self, state: MigrationState) -> Self {
        self.migration_state = Some(state);
        self
    }

    /// Set the node name and return self for chaining
    pub fn node_name(mut self, node: impl Into<String>) -> Self {
        self.node_name = Some(node.into());
        self
    }
}

impl VirtualMachineInstance {
    /// Reported phase, absent when the controller has not published one
    pub fn phase(&self) -> Option<InstancePhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    /// Conditions reported for the instance (empty when status is absent)
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    /// Live migration state, when one is tracked
    pub fn migration_state(&self) -> Option<&MigrationState> {
        self.status.as_ref().and_then(|s| s.migration_state.as_ref())
    }

    /// The instance-level Failure condition, when present
    pub fn failure_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_FAILURE)
    }

    /// The Ready condition, when present
    pub fn ready_condition(&self) -> Option<&Condition> {
        find_condition(self.conditions(), CONDITION_READY)
    }

    /// Returns true while a Paused condition is attached
    ///
    /// Presence is what matters; the pause controller removes the condition
    /// on unpause rather than flipping its status.
    pub fn is_paused(&self) -> bool {
        find_condition(self.conditions(), CONDITION_PAUSED).is_some()
    }

    /// Returns true when the guest agent is reachable
    pub fn agent_connected(&self) -> bool {
        condition_is_true(self.conditions(), CONDITION_AGENT_CONNECTED)
    }
}
