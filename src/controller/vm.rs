//! VirtualMachine observer implementation
//!
//! This module implements the reconciliation logic for watched machines.
//! Unlike a managing controller it never writes to the cluster: each pass
//! rebuilds the machine's view from the shared snapshot, runs the status
//! engine over it, and logs the outcome (state transitions, advisory
//! warnings, fleet totals) before requeueing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::runtime::controller::Action;
use kube::runtime::reflector::Store;
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
use mockall::automock;

use crate::crd::{VirtualMachine, VirtualMachineInstance, VirtualMachineRestore};
use crate::status::{
    fleet_status, migration_message, resolve, state_description, warning_message, LifecycleState,
};
use crate::store::{ObjectKey, Snapshot};
use crate::{Error, ERROR_REQUEUE_SECS};

/// Trait abstracting where cluster snapshots come from
///
/// The watch layer keeps reflector stores current; reconciliation only ever
/// reads a point-in-time copy. The trait allows substituting fixture
/// snapshots in tests.
#[cfg_attr(test, automock)]
pub trait SnapshotSource: Send + Sync {
    /// Build a snapshot of the currently watched resources.
    fn snapshot(&self) -> Snapshot;
}

/// Real snapshot source folding the kube reflector stores
pub struct SnapshotSourceImpl {
    vms: Store<VirtualMachine>,
    instances: Store<VirtualMachineInstance>,
    pods: Store<Pod>,
    restores: Store<VirtualMachineRestore>,
}

impl SnapshotSourceImpl {
    /// Bundle the reflector stores the watch layer keeps current
    pub fn new(
        vms: Store<VirtualMachine>,
        instances: Store<VirtualMachineInstance>,
        pods: Store<Pod>,
        restores: Store<VirtualMachineRestore>,
    ) -> Self {
        Self {
            vms,
            instances,
            pods,
            restores,
        }
    }
}

impl SnapshotSource for SnapshotSourceImpl {
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for vm in self.vms.state() {
            snapshot.upsert_vm(vm.as_ref().clone());
        }
        for instance in self.instances.state() {
            snapshot.upsert_instance(instance.as_ref().clone());
        }
        for pod in self.pods.state() {
            snapshot.upsert_pod(pod.as_ref());
        }
        for restore in self.restores.state() {
            snapshot.upsert_restore(restore.as_ref().clone());
        }

        snapshot
    }
}

/// Observer context shared across all reconciliation calls
///
/// Holds the snapshot source and the per-machine state history that lets
/// reconcile report transitions instead of repeating the same state.
pub struct Context {
    /// Source of point-in-time cluster snapshots
    pub source: Arc<dyn SnapshotSource>,

    /// Interval between periodic re-evaluations of a machine
    pub requeue: Duration,

    /// Last state recorded per machine
    seen: Mutex<BTreeMap<ObjectKey, LifecycleState>>,
}

impl Context {
    /// Create an observer context over the given snapshot source
    pub fn new(source: Arc<dyn SnapshotSource>, requeue: Duration) -> Self {
        Self {
            source,
            requeue,
            seen: Mutex::new(BTreeMap::new()),
        }
    }

    /// Last state recorded for a machine, if it is being tracked
    pub fn last_state(&self, key: &ObjectKey) -> Option<LifecycleState> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Record a freshly resolved state and log any transition
    ///
    /// Machines no longer present in the snapshot are dropped from the
    /// history so a deleted machine is reported once and then forgotten.
    fn observe(&self, snapshot: &Snapshot, key: ObjectKey, state: LifecycleState) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);

        seen.retain(|tracked, last| {
            let live = snapshot.contains_vm(tracked);
            if !live {
                info!(vm = %tracked, last_state = %last, "machine removed");
            }
            live
        });

        match seen.insert(key.clone(), state.clone()) {
            None => info!(vm = %key, state = %state, "tracking machine"),
            Some(previous) if previous != state => {
                info!(vm = %key, from = %previous, to = %state, "state changed");
            }
            Some(_) => debug!(vm = %key, state = %state, "state unchanged"),
        }
    }

    /// Create a context for testing with a mock snapshot source
    #[cfg(test)]
    pub fn for_testing(source: Arc<dyn SnapshotSource>) -> Self {
        Self::new(source, Duration::from_secs(crate::DEFAULT_REQUEUE_SECS))
    }
}

/// Reconcile one VirtualMachine
///
/// Rebuilds the machine's view from the latest snapshot, resolves its
/// effective state, and logs what changed. The machine carried by the watch
/// event is folded into the snapshot first, so evaluation never lags behind
/// the event that triggered it.
///
/// # Returns
///
/// Always requeues at the context's interval; satellite resources changing
/// between events are picked up on the next pass.
#[instrument(skip(vm, ctx), fields(vm = %ObjectKey::of(vm.as_ref())))]
pub async fn reconcile(vm: Arc<VirtualMachine>, ctx: Arc<Context>) -> Result<Action, Error> {
    let key = ObjectKey::of(vm.as_ref());

    let mut snapshot = ctx.source.snapshot();
    snapshot.upsert_vm(vm.as_ref().clone());

    let Some(view) = snapshot.vm_view(&key) else {
        warn!("machine vanished from the snapshot mid-evaluation");
        return Ok(Action::requeue(ctx.requeue));
    };

    let record = resolve(&view);

    if let Some(warning) = warning_message(&view) {
        warn!(
            source = %warning.source,
            message = warning.message.as_deref().unwrap_or(""),
            dismissible = warning.dismissible(),
            "warning raised"
        );
    }

    if let Some(failed) = migration_message(&view) {
        warn!(
            state = %failed.state,
            message = failed.message.as_deref().unwrap_or(""),
            "live migration failed"
        );
    }

    if let Some(note) = state_description(view.vm) {
        debug!(note, "restart pending");
    }

    ctx.observe(&snapshot, key, record.state);

    let fleet = fleet_status(&snapshot);
    debug!(
        machines = snapshot.vm_count(),
        warnings = fleet.warning_count,
        errors = fleet.error_count,
        "fleet totals"
    );

    Ok(Action::requeue(ctx.requeue))
}

/// Error policy for the observer
///
/// Reconciliation is read-only, so any failure is transient (watch streams,
/// snapshot access); retry on a short fixed delay.
pub fn error_policy(vm: Arc<VirtualMachine>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        vm = %ObjectKey::of(vm.as_ref()),
        "reconciliation failed"
    );

    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}
