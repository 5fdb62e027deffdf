//! Advisory channels beside the lifecycle state
//!
//! The resolved state answers "what is this machine doing"; the advisories
//! here answer "what should the operator look at". They are derived from the
//! same view, independently of which evaluator won the waterfall.

use crate::crd::{VirtualMachine, VolumeRestore};
use crate::status::resolver::resolve;
use crate::status::state::{StateRecord, MIGRATION_FAILED_MESSAGE, RESTART_REQUIRED_MESSAGE};
use crate::store::VmView;

/// Signal a warning originates from, in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum WarningSource {
    /// Namespace quota blocks the machine
    InsufficientResourceQuota,
    /// VM controller reported a Failure condition
    VmFailure,
    /// Instance controller reported a Failure condition
    InstanceFailure,
    /// Launcher pod is in an error status
    LauncherPod,
}

impl std::fmt::Display for WarningSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientResourceQuota => write!(f, "Insufficient resource quota"),
            Self::VmFailure => write!(f, "VM error"),
            Self::InstanceFailure => write!(f, "Instance error"),
            Self::LauncherPod => write!(f, "Launcher pod error"),
        }
    }
}

/// Warning surfaced next to a machine's state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    /// Which signal raised it
    pub source: WarningSource,

    /// Explanatory text, when the signal carries one
    pub message: Option<String>,
}

impl Warning {
    /// Quota warnings are the only dismissible kind
    pub fn dismissible(&self) -> bool {
        self.source == WarningSource::InsufficientResourceQuota
    }
}

/// First warning that applies, checked in signal priority order
///
/// Pod errors only count once the machine is backed by an instance; a stray
/// launcher pod of a never-created machine stays silent.
pub fn warning_message(view: &VmView<'_>) -> Option<Warning> {
    if let Some(message) = view.vm.insufficient_resource_message() {
        return Some(Warning {
            source: WarningSource::InsufficientResourceQuota,
            message: Some(message.to_string()),
        });
    }

    if let Some(condition) = view.vm.failure_condition() {
        return Some(Warning {
            source: WarningSource::VmFailure,
            message: condition.message.clone(),
        });
    }

    if let Some(condition) = view.instance.and_then(|vmi| vmi.failure_condition()) {
        return Some(Warning {
            source: WarningSource::InstanceFailure,
            message: condition.message.clone(),
        });
    }

    if view.instance.is_some() || view.vm.is_created() {
        if let Some(pod) = view.pod.filter(|pod| pod.status.is_error()) {
            return Some(Warning {
                source: WarningSource::LauncherPod,
                message: pod.message.clone(),
            });
        }
    }

    None
}

/// Advisory for a failed live migration
///
/// Reports the machine's resolved record with the failure advisory attached;
/// `None` while no failed migration is tracked. The resolved state is
/// whatever the waterfall picks, since a failed migration no longer overrides
/// it.
pub fn migration_message(view: &VmView<'_>) -> Option<StateRecord> {
    let state = view.instance?.migration_state()?;

    state
        .is_failed()
        .then(|| resolve(view).message(MIGRATION_FAILED_MESSAGE))
}

/// Standing note shown under the state while a restart is pending
pub fn state_description(vm: &VirtualMachine) -> Option<&'static str> {
    vm.restart_required().then_some(RESTART_REQUIRED_MESSAGE)
}

/// Live progress of a linked restore operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreProgress {
    /// Overall percentage (0-100)
    pub percentage: u8,

    /// Per-volume restore records
    pub volumes: Vec<VolumeRestore>,
}

/// Progress of the linked restore, while one is publishing status
///
/// Suppressed for failed or terminating machines; their restore numbers
/// would be stale noise.
pub fn restore_progress(view: &VmView<'_>) -> Option<RestoreProgress> {
    if view.vm.failure_condition().is_some() || view.vm.is_terminating() {
        return None;
    }

    let restore = view.restore?;

    restore.has_status().then(|| RestoreProgress {
        percentage: restore.progress(),
        volumes: restore.volumes().to_vec(),
    })
}

/// Whether the linked restore, if any, has completed
pub fn restore_complete(view: &VmView<'_>) -> bool {
    view.restore
        .map(|restore| restore.is_complete())
        .unwrap_or(true)
}
