//! Desired-run resolution
//!
//! Every stop/start-shaped evaluator asks the same question first: does the
//! owner want this machine running? The answer folds the explicit `running`
//! flag, the declared run strategy, pending state-change requests, and the
//! control plane's printable status into a single boolean.

use crate::crd::{RunStrategy, StateChangeAction, VirtualMachine};

/// Printable status reported while the scheduler cannot place the instance
const ERROR_UNSCHEDULABLE: &str = "ErrorUnschedulable";

/// Printable statuses that show the control plane is driving toward running
const ACTIVE_STATUSES: &[&str] = &["Starting", "Running"];

/// Transient scheduling messages that do not count against RerunOnFailure
pub const IGNORE_MESSAGES: &[&str] = &["pod has unbound immediate PersistentVolumeClaims"];

/// Resolve whether the owner wants this machine running
///
/// The explicit `running` flag wins outright when set, even over an Always
/// strategy. Otherwise the run strategy decides; with neither set the answer
/// is no.
pub fn expected_running(vm: &VirtualMachine) -> bool {
    if let Some(running) = vm.running() {
        return running;
    }

    let Some(strategy) = vm.run_strategy() else {
        return false;
    };

    match strategy {
        RunStrategy::Halted => false,
        RunStrategy::Always => true,
        RunStrategy::RerunOnFailure => {
            // Parked on a transient scheduling failure still counts as
            // expected; the strategy will retry the instance.
            if vm.printable_status() == Some(ERROR_UNSCHEDULABLE)
                && has_ignorable_scheduling_message(vm)
            {
                return true;
            }

            is_active_status(vm.printable_status())
        }
        // Strategies outside the known vocabulary get the manual treatment.
        RunStrategy::Manual | RunStrategy::Unrecognized => {
            let requests = vm.state_change_requests();
            let requested =
                |action: StateChangeAction| requests.iter().any(|r| r.action == action);

            if requested(StateChangeAction::Stop) {
                return false;
            }
            if requested(StateChangeAction::Start) {
                return true;
            }
            if requests.is_empty() {
                return is_active_status(vm.printable_status());
            }

            // Only unrecognized requests remain; fall back to whether an
            // instance exists at all.
            vm.is_created()
        }
    }
}

fn is_active_status(status: Option<&str>) -> bool {
    status.is_some_and(|status| ACTIVE_STATUSES.contains(&status))
}

/// The pattern list matches as one comma-joined string, so a message only
/// qualifies when it contains every entry back to back.
fn has_ignorable_scheduling_message(vm: &VirtualMachine) -> bool {
    let joined = IGNORE_MESSAGES.join(",");

    vm.conditions().iter().any(|condition| {
        condition
            .message
            .as_deref()
            .is_some_and(|message| message.contains(&joined))
    })
}
