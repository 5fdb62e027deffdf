//! Fleet aggregation
//!
//! Folds the resolved state of every machine in a snapshot into two counts
//! for summary displays. Classification happens on the resolved state only,
//! so the tallies always agree with what each machine reports individually.

use crate::status::resolver::resolve_state;
use crate::status::state::LifecycleState;
use crate::store::Snapshot;

/// Warning and error tallies across a fleet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FleetStatus {
    /// Machines in a transitional state that deserves attention
    pub warning_count: usize,

    /// Machines in an error state
    pub error_count: usize,
}

impl FleetStatus {
    /// Fold one resolved state into the tallies
    pub fn absorb(&mut self, state: &LifecycleState) {
        if state.is_error() {
            self.error_count += 1;
        } else if state.is_warning() {
            self.warning_count += 1;
        }
    }

    /// Combine two tallies; commutative, so partial scans merge in any order
    pub fn merge(self, other: Self) -> Self {
        Self {
            warning_count: self.warning_count + other.warning_count,
            error_count: self.error_count + other.error_count,
        }
    }
}

/// Tally every machine in the snapshot
pub fn fleet_status(snapshot: &Snapshot) -> FleetStatus {
    let mut totals = FleetStatus::default();
    for view in snapshot.views() {
        totals.absorb(&resolve_state(&view));
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        Condition, ConditionStatus, InstancePhase, RunStrategy, VirtualMachine,
        VirtualMachineInstance, VirtualMachineInstanceSpec, VirtualMachineInstanceStatus,
        VirtualMachineSpec, VirtualMachineStatus, CONDITION_FAILURE, CONDITION_READY,
    };

    fn vm(name: &str, strategy: RunStrategy, created: bool) -> VirtualMachine {
        let mut vm = VirtualMachine::new(
            name,
            VirtualMachineSpec {
                run_strategy: Some(strategy),
                ..Default::default()
            },
        );
        vm.metadata.namespace = Some("default".to_string());
        vm.status = Some(VirtualMachineStatus::default().created(created));
        vm
    }

    fn instance(name: &str, status: VirtualMachineInstanceStatus) -> VirtualMachineInstance {
        let mut vmi = VirtualMachineInstance::new(name, VirtualMachineInstanceSpec::default());
        vmi.metadata.namespace = Some("default".to_string());
        vmi.status = Some(status);
        vmi
    }

    /// Story: a mixed fleet. One machine is failed, one is stopping, one is
    /// waiting on its instance, one runs happily and one is off. The summary
    /// reports exactly one error and two warnings.
    #[test]
    fn story_mixed_fleet_tallies() {
        let mut snapshot = Snapshot::new();

        let mut failed = vm("failed", RunStrategy::Always, true);
        failed.status = Some(failed.status.take().unwrap_or_default().condition(
            Condition::new(CONDITION_FAILURE, ConditionStatus::True).message("degraded"),
        ));
        snapshot.upsert_vm(failed);

        snapshot.upsert_vm(vm("stopping", RunStrategy::Halted, true));
        snapshot.upsert_instance(instance(
            "stopping",
            VirtualMachineInstanceStatus::default().phase(InstancePhase::Running),
        ));

        snapshot.upsert_vm(vm("waiting", RunStrategy::Always, false));

        snapshot.upsert_vm(vm("running", RunStrategy::Always, true));
        snapshot.upsert_instance(instance(
            "running",
            VirtualMachineInstanceStatus::default()
                .phase(InstancePhase::Running)
                .condition(Condition::new(CONDITION_READY, ConditionStatus::True)),
        ));

        snapshot.upsert_vm(vm("off", RunStrategy::Halted, false));

        let totals = fleet_status(&snapshot);
        assert_eq!(totals.error_count, 1);
        assert_eq!(totals.warning_count, 2);
    }

    #[test]
    fn test_empty_snapshot_tallies_zero() {
        let totals = fleet_status(&Snapshot::new());
        assert_eq!(totals, FleetStatus::default());
    }

    #[test]
    fn test_paused_counts_in_neither_bucket() {
        let mut snapshot = Snapshot::new();
        snapshot.upsert_vm(vm("paused", RunStrategy::Always, true));
        snapshot.upsert_instance(instance(
            "paused",
            VirtualMachineInstanceStatus::default()
                .condition(Condition::new("Paused", ConditionStatus::True)),
        ));

        let totals = fleet_status(&snapshot);
        assert_eq!(totals, FleetStatus::default());
    }

    #[test]
    fn test_terminating_counts_as_warning() {
        use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

        let mut snapshot = Snapshot::new();
        let mut vm = vm("doomed", RunStrategy::Always, true);
        vm.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        snapshot.upsert_vm(vm);

        assert_eq!(fleet_status(&snapshot).warning_count, 1);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = FleetStatus {
            warning_count: 2,
            error_count: 1,
        };
        let b = FleetStatus {
            warning_count: 5,
            error_count: 0,
        };
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(
            a.merge(b),
            FleetStatus {
                warning_count: 7,
                error_count: 1,
            }
        );
    }

    #[test]
    fn test_idempotent_over_unchanged_snapshot() {
        let mut snapshot = Snapshot::new();
        snapshot.upsert_vm(vm("waiting", RunStrategy::Always, false));

        assert_eq!(fleet_status(&snapshot), fleet_status(&snapshot));
    }
}
