//! Typed declarations of the watched resources
//!
//! This module declares the control-plane resources the status engine reads:
//! the KubeVirt VirtualMachine and VirtualMachineInstance, and the
//! Harvester-style image, restore, and quota resources.

mod image;
mod instance;
mod quota;
mod restore;
mod types;
mod virtual_machine;

pub use image::{
    ImageSourceType, VirtualMachineImage, VirtualMachineImageSpec, VirtualMachineImageStatus,
    CONDITION_IMPORTED, CONDITION_INITIALIZED, CONDITION_RETRY_LIMIT_EXCEEDED,
};
pub use instance::{
    VirtualMachineInstance, VirtualMachineInstanceSpec, VirtualMachineInstanceStatus,
};
pub use quota::{ResourceQuota, ResourceQuotaSpec, SnapshotLimit};
pub use restore::{
    VirtualMachineRestore, VirtualMachineRestoreSpec, VirtualMachineRestoreStatus, VolumeRestore,
};
pub use types::{
    condition_is_true, find_condition, Condition, ConditionStatus, InstancePhase, MigrationState,
    RunStrategy, StateChangeAction, StateChangeRequest, CONDITION_AGENT_CONNECTED,
    CONDITION_FAILURE, CONDITION_PAUSED, CONDITION_READY, CONDITION_RESTART_REQUIRED,
    MIGRATION_STATUS_FAILED, REASON_UNSCHEDULABLE,
};
pub use virtual_machine::{
    CloudInitNoCloud, InstanceTemplate, InstanceTemplateSpec, VirtualMachine, VirtualMachineSpec,
    VirtualMachineStatus, Volume, ANNOTATION_DEVICE_ALLOCATION_DETAILS,
    ANNOTATION_INSUFFICIENT_RESOURCE_QUOTA, ANNOTATION_RESTORE_NAME,
};
