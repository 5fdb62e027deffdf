//! Launcher pod classification
//!
//! Each running instance is backed by a launcher pod. The classifier folds
//! the pod's conditions, container statuses, and phase into a single
//! `PodStatus`, which the starting evaluator and the warning channel consume
//! through the error / ready set predicates.

use k8s_openapi::api::core::v1::{ContainerStatus, Pod};

/// Scheduling condition type on pods
const POD_SCHEDULED: &str = "PodScheduled";

/// Condition reason when the scheduler cannot place the pod
const REASON_UNSCHEDULABLE: &str = "Unschedulable";

/// Waiting reason for a container stuck in a restart loop
const CRASH_LOOP_BACK_OFF: &str = "CrashLoopBackOff";

/// Container waiting reasons treated as failures rather than progress
const FAILING_WAIT_REASONS: &[&str] = &[
    "ErrImagePull",
    "ImagePullBackOff",
    "InvalidImageName",
    "CreateContainerConfigError",
    "CreateContainerError",
    "RunContainerError",
];

/// Condensed launcher pod status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PodStatus {
    /// The scheduler cannot place the pod
    NotSchedulable,
    /// A container is waiting on an error or exited non-zero
    ContainerFailing,
    /// The pod phase is Failed
    Failed,
    /// A container is in a restart loop
    CrashLoopBackOff,
    /// The pod phase is absent or unrecognized
    Unknown,
    /// The pod phase is Running
    Running,
    /// Every container terminated cleanly
    Completed,
    /// The pod phase is Succeeded
    Succeeded,
    /// The pod phase is Pending and nothing has failed yet
    Pending,
}

impl PodStatus {
    /// Returns true for statuses that indicate a launcher failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NotSchedulable
                | Self::ContainerFailing
                | Self::Failed
                | Self::CrashLoopBackOff
                | Self::Unknown
        )
    }

    /// Returns true for statuses that indicate the pod reached its goal
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Running | Self::Completed | Self::Succeeded)
    }
}

/// Classifier verdict: a status plus the text that explains it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodSummary {
    /// Condensed status
    pub status: PodStatus,

    /// Condition or container message backing the status
    pub message: Option<String>,
}

impl PodSummary {
    fn new(status: PodStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

/// Classify a launcher pod
///
/// Scheduling failures win over container failures, which win over the
/// phase. A pod with no status block classifies as `Unknown`.
pub fn classify(pod: &Pod) -> PodSummary {
    let status = pod.status.as_ref();

    if let Some(condition) = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == POD_SCHEDULED))
    {
        if condition.status == "False" && condition.reason.as_deref() == Some(REASON_UNSCHEDULABLE)
        {
            return PodSummary::new(PodStatus::NotSchedulable).message(condition.message.clone());
        }
    }

    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    if let Some(summary) = containers.iter().find_map(failing_container) {
        return summary;
    }

    if !containers.is_empty() && containers.iter().all(terminated_cleanly) {
        return PodSummary::new(PodStatus::Completed);
    }

    match status.and_then(|s| s.phase.as_deref()) {
        Some("Running") => PodSummary::new(PodStatus::Running),
        Some("Succeeded") => PodSummary::new(PodStatus::Succeeded),
        Some("Pending") => PodSummary::new(PodStatus::Pending),
        Some("Failed") => {
            PodSummary::new(PodStatus::Failed).message(status.and_then(|s| s.message.clone()))
        }
        _ => PodSummary::new(PodStatus::Unknown),
    }
}

fn failing_container(container: &ContainerStatus) -> Option<PodSummary> {
    let state = container.state.as_ref()?;

    if let Some(waiting) = state.waiting.as_ref() {
        let reason = waiting.reason.as_deref().unwrap_or_default();
        let message = waiting.message.clone().or_else(|| waiting.reason.clone());

        if reason == CRASH_LOOP_BACK_OFF {
            return Some(PodSummary::new(PodStatus::CrashLoopBackOff).message(message));
        }
        if FAILING_WAIT_REASONS.contains(&reason) {
            return Some(PodSummary::new(PodStatus::ContainerFailing).message(message));
        }
    }

    if let Some(terminated) = state.terminated.as_ref() {
        if terminated.exit_code != 0 {
            let message = terminated.message.clone().or_else(|| terminated.reason.clone());

            return Some(PodSummary::new(PodStatus::ContainerFailing).message(message));
        }
    }

    None
}

fn terminated_cleanly(container: &ContainerStatus) -> bool {
    container
        .state
        .as_ref()
        .and_then(|state| state.terminated.as_ref())
        .is_some_and(|terminated| terminated.exit_code == 0)
}
