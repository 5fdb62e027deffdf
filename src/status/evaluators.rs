//! Condition evaluators
//!
//! Each evaluator is a pure predicate over one [`VmView`]: it either declines
//! (`None`) or emits the record it stands for. They are independent of each
//! other and of evaluation order; the precedence resolver decides which
//! verdict wins. [`other`] is the one exception: it is total and terminates
//! the waterfall.

use crate::crd::{condition_is_true, ConditionStatus, InstancePhase, CONDITION_READY,
    REASON_UNSCHEDULABLE};
use crate::status::expectation::expected_running;
use crate::status::state::{
    LifecycleState, StateRecord, PAUSED_MESSAGE, STARTING_MESSAGE, UNSCHEDULABLE_MESSAGE,
    WAITING_FOR_RESOURCES_MESSAGE,
};
use crate::store::VmView;

/// Scheduler cannot place the instance while it is starting or stopping
///
/// Only applies when the machine is in a start or stop transition; a parked
/// unschedulable condition on an otherwise settled machine stays invisible.
pub fn unschedulable(view: &VmView<'_>) -> Option<StateRecord> {
    if stopping(view).is_none() && starting(view).is_none() {
        return None;
    }

    let condition = view
        .vm
        .conditions()
        .iter()
        .find(|c| c.reason.as_deref() == Some(REASON_UNSCHEDULABLE))?;

    let message = condition
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(UNSCHEDULABLE_MESSAGE);

    Some(StateRecord::new(LifecycleState::Unschedulable).message(message))
}

/// Instance carries a Paused condition
pub fn paused(view: &VmView<'_>) -> Option<StateRecord> {
    view.instance?
        .is_paused()
        .then(|| StateRecord::new(LifecycleState::Paused).message(PAUSED_MESSAGE))
}

/// VM controller reported a Failure condition
pub fn vm_error(view: &VmView<'_>) -> Option<StateRecord> {
    let condition = view.vm.failure_condition()?;

    let mut record = StateRecord::new(LifecycleState::VmError);
    if let Some(message) = &condition.message {
        record = record.detailed_message(message);
    }
    Some(record)
}

/// Stop is desired but the instance never left Pending
pub fn pending(view: &VmView<'_>) -> Option<StateRecord> {
    if expected_running(view.vm) || !view.vm.is_created() {
        return None;
    }

    (view.instance?.phase()? == InstancePhase::Pending)
        .then(|| StateRecord::new(LifecycleState::Pending))
}

/// Stop is desired and the instance is winding down
pub fn stopping(view: &VmView<'_>) -> Option<StateRecord> {
    if expected_running(view.vm) || !view.vm.is_created() {
        return None;
    }

    let phase = view.instance?.phase()?;
    (phase != InstancePhase::Succeeded && phase != InstancePhase::Pending)
        .then(|| StateRecord::new(LifecycleState::Stopping))
}

/// Nothing asks for this machine to run
pub fn off(view: &VmView<'_>) -> Option<StateRecord> {
    (!expected_running(view.vm)).then(|| StateRecord::new(LifecycleState::Off))
}

/// Instance controller reported a Failure condition
pub fn instance_error(view: &VmView<'_>) -> Option<StateRecord> {
    let condition = view.instance?.failure_condition()?;

    let mut record = StateRecord::new(LifecycleState::InstanceError);
    if let Some(message) = &condition.message {
        record = record.detailed_message(message);
    }
    Some(record)
}

/// Guest is running and passes its readiness probe
pub fn running(view: &VmView<'_>) -> Option<StateRecord> {
    let instance = view.instance?;

    (instance.phase()? == InstancePhase::Running
        && condition_is_true(instance.conditions(), CONDITION_READY))
        .then(|| StateRecord::new(LifecycleState::Running))
}

/// Guest is running but the readiness probe reports False
pub fn not_ready(view: &VmView<'_>) -> Option<StateRecord> {
    let instance = view.instance?;
    let ready = instance.ready_condition()?;

    (ready.status == ConditionStatus::False && instance.phase()? == InstancePhase::Running)
        .then(|| StateRecord::new(LifecycleState::NotReady))
}

/// Run is desired and an instance exists but is not ready yet
///
/// When the launcher pod is short of its goal its message becomes the
/// diagnostic detail.
pub fn starting(view: &VmView<'_>) -> Option<StateRecord> {
    if !expected_running(view.vm) || !view.vm.is_created() {
        return None;
    }

    let detail = view
        .pod
        .filter(|pod| !pod.status.is_ready())
        .and_then(|pod| pod.message.clone());

    let mut record = StateRecord::new(LifecycleState::Starting).message(STARTING_MESSAGE);
    if let Some(detail) = detail {
        record = record.detailed_message(detail);
    }
    Some(record)
}

/// Run is desired but no instance has been created yet
pub fn waiting_for_instance(view: &VmView<'_>) -> Option<StateRecord> {
    (expected_running(view.vm) && !view.vm.is_created()).then(|| {
        StateRecord::new(LifecycleState::Waiting).message(WAITING_FOR_RESOURCES_MESSAGE)
    })
}

/// Terminal fallback over the raw instance phase; never declines
pub fn other(view: &VmView<'_>) -> StateRecord {
    if let Some(instance) = view.instance {
        match instance.phase() {
            Some(InstancePhase::Scheduling | InstancePhase::Scheduled) => {
                return StateRecord::new(LifecycleState::Starting).message(STARTING_MESSAGE);
            }
            Some(InstancePhase::Pending) => {
                return StateRecord::new(LifecycleState::InstanceWaiting)
                    .message(WAITING_FOR_RESOURCES_MESSAGE);
            }
            Some(InstancePhase::Failed) => {
                return StateRecord::new(LifecycleState::InstanceFailed);
            }
            _ => {}
        }
    }

    if expected_running(view.vm) && !view.vm.is_created() {
        return StateRecord::new(LifecycleState::Pending);
    }

    StateRecord::new(LifecycleState::Unknown)
}
