//! Precedence resolution
//!
//! The state machine core: a fixed-order waterfall over the condition
//! evaluators, preceded by the restore and deletion overrides and the live
//! migration passthrough. Resolution is stateless; every call recomputes the
//! answer from the view alone, so repeated calls over unchanged inputs agree.

use crate::status::evaluators;
use crate::status::state::{LifecycleState, StateRecord};
use crate::store::VmView;

/// A single precedence step: declines or emits a record
pub type Evaluator = fn(&VmView<'_>) -> Option<StateRecord>;

/// Evaluation order below the overrides; the first verdict wins
pub const WATERFALL: &[Evaluator] = &[
    evaluators::unschedulable,
    evaluators::paused,
    evaluators::vm_error,
    evaluators::pending,
    evaluators::stopping,
    evaluators::off,
    evaluators::instance_error,
    evaluators::running,
    evaluators::not_ready,
    evaluators::starting,
    evaluators::waiting_for_instance,
];

/// Resolve the effective lifecycle state of one machine
///
/// Total over every view: an incomplete linked restore wins over everything,
/// deletion comes next, then a tracked live migration reports its raw status
/// verbatim, then the waterfall, and the terminal fallback catches the rest.
pub fn resolve(view: &VmView<'_>) -> StateRecord {
    if restore_incomplete(view) {
        return StateRecord::new(LifecycleState::Restoring);
    }

    if view.vm.is_terminating() {
        return StateRecord::new(LifecycleState::Terminating);
    }

    if let Some(status) = live_migration_status(view) {
        return StateRecord::new(LifecycleState::Migrating(status.to_string()));
    }

    for evaluator in WATERFALL {
        if let Some(record) = evaluator(view) {
            return record;
        }
    }

    evaluators::other(view)
}

/// Shorthand for callers that only need the state
pub fn resolve_state(view: &VmView<'_>) -> LifecycleState {
    resolve(view).state
}

fn restore_incomplete(view: &VmView<'_>) -> bool {
    view.restore.is_some_and(|restore| !restore.is_complete())
}

/// Raw migration status, while one is tracked, carries a status, and has not
/// failed
fn live_migration_status<'a>(view: &VmView<'a>) -> Option<&'a str> {
    let state = view.instance?.migration_state()?;
    if state.is_failed() {
        return None;
    }
    state.status.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        Condition, ConditionStatus, InstancePhase, MigrationState, RunStrategy, VirtualMachine,
        VirtualMachineInstance, VirtualMachineInstanceSpec, VirtualMachineInstanceStatus,
        VirtualMachineRestore, VirtualMachineRestoreSpec, VirtualMachineRestoreStatus,
        VirtualMachineSpec, VirtualMachineStatus, CONDITION_FAILURE, CONDITION_PAUSED,
        CONDITION_READY,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    fn vm(strategy: RunStrategy, created: bool) -> VirtualMachine {
        let mut vm = VirtualMachine::new(
            "web-0",
            VirtualMachineSpec {
                run_strategy: Some(strategy),
                ..Default::default()
            },
        );
        vm.status = Some(VirtualMachineStatus::default().created(created));
        vm
    }

    fn instance_with(status: VirtualMachineInstanceStatus) -> VirtualMachineInstance {
        let mut vmi = VirtualMachineInstance::new("web-0", VirtualMachineInstanceSpec::default());
        vmi.status = Some(status);
        vmi
    }

    fn restore(complete: bool) -> VirtualMachineRestore {
        let mut restore =
            VirtualMachineRestore::new("restore-web-0", VirtualMachineRestoreSpec::default());
        restore.status = Some(VirtualMachineRestoreStatus {
            complete: Some(complete),
            ..Default::default()
        });
        restore
    }

    fn view<'a>(
        vm: &'a VirtualMachine,
        instance: Option<&'a VirtualMachineInstance>,
    ) -> VmView<'a> {
        VmView {
            vm,
            instance,
            pod: None,
            restore: None,
            quota: None,
        }
    }

    /// Story: an operator restores a machine from backup and deletes it
    /// before the restore finishes. Both signals are present; the machine
    /// must keep reporting Restoring rather than Terminating until the
    /// restore completes.
    #[test]
    fn story_restore_outranks_deletion() {
        let mut machine = vm(RunStrategy::Always, true);
        machine.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));

        let incomplete = restore(false);
        let mut terminating_view = view(&machine, None);
        terminating_view.restore = Some(&incomplete);

        assert_eq!(resolve_state(&terminating_view), LifecycleState::Restoring);

        // Once the restore completes, deletion shows through
        let complete = restore(true);
        terminating_view.restore = Some(&complete);
        assert_eq!(resolve_state(&terminating_view), LifecycleState::Terminating);
    }

    #[test]
    fn test_restore_without_status_counts_as_incomplete() {
        let machine = vm(RunStrategy::Always, true);
        let pending_restore =
            VirtualMachineRestore::new("restore-web-0", VirtualMachineRestoreSpec::default());

        let mut restoring_view = view(&machine, None);
        restoring_view.restore = Some(&pending_restore);

        assert_eq!(resolve_state(&restoring_view), LifecycleState::Restoring);
    }

    #[test]
    fn test_migration_status_reports_verbatim() {
        let machine = vm(RunStrategy::Always, true);
        let vmi = instance_with(VirtualMachineInstanceStatus::default().migration_state(
            MigrationState {
                status: Some("PreparingTarget".to_string()),
                message: None,
            },
        ));

        let record = resolve(&view(&machine, Some(&vmi)));
        assert_eq!(
            record.state,
            LifecycleState::Migrating("PreparingTarget".to_string())
        );
        assert_eq!(record.state.to_string(), "PreparingTarget");
    }

    #[test]
    fn test_failed_migration_falls_through_to_the_waterfall() {
        let machine = vm(RunStrategy::Always, true);
        let vmi = instance_with(
            VirtualMachineInstanceStatus::default()
                .phase(InstancePhase::Running)
                .condition(Condition::new(CONDITION_READY, ConditionStatus::True))
                .migration_state(MigrationState {
                    status: Some("Failed".to_string()),
                    message: None,
                }),
        );

        assert_eq!(resolve_state(&view(&machine, Some(&vmi))), LifecycleState::Running);
    }

    #[test]
    fn test_statusless_migration_falls_through_to_the_waterfall() {
        let machine = vm(RunStrategy::Always, true);
        let vmi = instance_with(
            VirtualMachineInstanceStatus::default()
                .phase(InstancePhase::Running)
                .condition(Condition::new(CONDITION_READY, ConditionStatus::True))
                .migration_state(MigrationState {
                    status: None,
                    message: None,
                }),
        );

        assert_eq!(resolve_state(&view(&machine, Some(&vmi))), LifecycleState::Running);
    }

    /// Story: a paused machine develops a VM-level failure. Pause wins for
    /// display because an operator-initiated pause is the more actionable
    /// signal, and the waterfall encodes exactly that order.
    #[test]
    fn story_paused_outranks_vm_error() {
        let mut machine = vm(RunStrategy::Always, true);
        machine.status = Some(machine.status.take().unwrap_or_default().condition(
            Condition::new(CONDITION_FAILURE, ConditionStatus::True).message("degraded"),
        ));
        let vmi = instance_with(VirtualMachineInstanceStatus::default().condition(
            Condition::new(CONDITION_PAUSED, ConditionStatus::True),
        ));

        assert_eq!(resolve_state(&view(&machine, Some(&vmi))), LifecycleState::Paused);
    }

    #[test]
    fn test_vm_error_outranks_instance_error() {
        let mut machine = vm(RunStrategy::Always, true);
        machine.status = Some(machine.status.take().unwrap_or_default().condition(
            Condition::new(CONDITION_FAILURE, ConditionStatus::True).message("vm degraded"),
        ));
        let vmi = instance_with(VirtualMachineInstanceStatus::default().condition(
            Condition::new(CONDITION_FAILURE, ConditionStatus::True).message("vmi degraded"),
        ));

        let record = resolve(&view(&machine, Some(&vmi)));
        assert_eq!(record.state, LifecycleState::VmError);
        assert_eq!(record.detailed_message.as_deref(), Some("vm degraded"));
    }

    #[test]
    fn test_halted_machine_without_instance_is_off() {
        let machine = vm(RunStrategy::Halted, false);
        assert_eq!(resolve_state(&view(&machine, None)), LifecycleState::Off);
    }

    #[test]
    fn test_running_machine_resolves_running() {
        let machine = vm(RunStrategy::Always, true);
        let vmi = instance_with(
            VirtualMachineInstanceStatus::default()
                .phase(InstancePhase::Running)
                .condition(Condition::new(CONDITION_READY, ConditionStatus::True)),
        );
        assert_eq!(resolve_state(&view(&machine, Some(&vmi))), LifecycleState::Running);
    }

    #[test]
    fn test_expected_but_uncreated_machine_is_waiting() {
        let machine = vm(RunStrategy::Always, false);
        let record = resolve(&view(&machine, None));
        assert_eq!(record.state, LifecycleState::Waiting);
        assert!(record.message.is_some());
    }

    /// Story: an operator stops a machine whose instance cannot be scheduled.
    /// The unschedulable signal outranks the stop transition, so the
    /// dashboard points at the scheduling problem instead of a bland
    /// Stopping.
    #[test]
    fn story_unschedulable_outranks_stopping() {
        let mut machine = vm(RunStrategy::Halted, true);
        machine.status = Some(
            machine.status.take().unwrap_or_default().condition(
                Condition::new("Ready", ConditionStatus::False)
                    .reason("Unschedulable")
                    .message("0/3 nodes are available"),
            ),
        );
        let vmi =
            instance_with(VirtualMachineInstanceStatus::default().phase(InstancePhase::Running));

        let record = resolve(&view(&machine, Some(&vmi)));
        assert_eq!(record.state, LifecycleState::Unschedulable);
        assert_eq!(record.message.as_deref(), Some("0/3 nodes are available"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let machine = vm(RunStrategy::Always, true);
        let vmi = instance_with(
            VirtualMachineInstanceStatus::default()
                .phase(InstancePhase::Running)
                .condition(Condition::new(CONDITION_READY, ConditionStatus::True)),
        );
        let running_view = view(&machine, Some(&vmi));

        let first = resolve(&running_view);
        let second = resolve(&running_view);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_expectation_corner_resolves() {
        // Totality: each (expected, created) corner lands somewhere
        for (strategy, created) in [
            (RunStrategy::Always, true),
            (RunStrategy::Always, false),
            (RunStrategy::Halted, true),
            (RunStrategy::Halted, false),
        ] {
            let machine = vm(strategy.clone(), created);
            let record = resolve(&view(&machine, None));
            assert_ne!(
                record.state,
                LifecycleState::Unknown,
                "strategy {strategy:?} created {created}"
            );
        }
    }
}
