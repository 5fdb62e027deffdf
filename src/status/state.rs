//! Lifecycle states and state records
//!
//! `LifecycleState` is the closed vocabulary the precedence resolver picks
//! from; `StateRecord` pairs a state with its optional advisory messages.
//! Display strings match what operators see in the dashboard, including the
//! raw fallback tokens of the last-resort states.

/// Advisory shown while an instance waits for resources
pub const WAITING_FOR_RESOURCES_MESSAGE: &str =
    "The virtual machine is waiting for resources to become available.";

/// Advisory shown while an instance is starting up
pub const STARTING_MESSAGE: &str =
    "This virtual machine will start shortly. Preparing storage, networking, and compute resources.";

/// Advisory shown while an instance is paused
pub const PAUSED_MESSAGE: &str =
    "This VM has been paused. If you wish to unpause it, please click the Unpause button below. \
     For further details, please check with your system administrator.";

/// Fallback message when an unschedulable condition carries no text
pub const UNSCHEDULABLE_MESSAGE: &str = "VM is unschedulable";

/// Advisory attached when a live migration ends in failure
pub const MIGRATION_FAILED_MESSAGE: &str =
    "Live migration failed. Check the virtual machine events for details.";

/// Advisory shown while a spec change waits for a restart
pub const RESTART_REQUIRED_MESSAGE: &str =
    "The virtual machine needs to restart to apply configuration changes.";

/// Effective lifecycle state of a virtual machine
///
/// Exactly one of these is produced per evaluation. `Migrating` carries the
/// migration controller's raw status string and displays it verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LifecycleState {
    /// An incomplete restore operation is linked to the VM
    Restoring,
    /// Deletion has been requested
    Terminating,
    /// A live migration is in flight; payload is its raw status
    Migrating(String),
    /// The scheduler cannot place the instance
    Unschedulable,
    /// The instance is paused
    Paused,
    /// The VM controller reported a failure
    VmError,
    /// Instance exists but has not been scheduled yet, while stop is desired
    Pending,
    /// Instance is winding down
    Stopping,
    /// No instance is desired or present
    Off,
    /// The instance controller reported a failure
    InstanceError,
    /// Guest is running and ready
    Running,
    /// Guest is running but the readiness probe fails
    NotReady,
    /// Instance is coming up
    Starting,
    /// Instance creation is expected but has not happened yet
    Waiting,
    /// Fallback: instance phase says resources are still pending
    InstanceWaiting,
    /// Fallback: instance phase reports failure
    InstanceFailed,
    /// Fallback: nothing else matched
    Unknown,
}

impl LifecycleState {
    /// Returns true for states counted in the fleet error bucket
    pub fn is_error(&self) -> bool {
        matches!(self, Self::VmError)
    }

    /// Returns true for states counted in the fleet warning bucket
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::Stopping | Self::Waiting | Self::Pending | Self::Starting | Self::Terminating
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Restoring => write!(f, "Restoring"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Migrating(status) => write!(f, "{status}"),
            Self::Unschedulable => write!(f, "Unschedulable"),
            Self::Paused => write!(f, "Paused"),
            Self::VmError => write!(f, "VM error"),
            Self::Pending => write!(f, "Pending"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Off => write!(f, "Off"),
            Self::InstanceError => write!(f, "Instance error"),
            Self::Running => write!(f, "Running"),
            Self::NotReady => write!(f, "Not Ready"),
            Self::Starting => write!(f, "Starting"),
            Self::Waiting => write!(f, "Waiting"),
            Self::InstanceWaiting => write!(f, "VMI_WAITING"),
            Self::InstanceFailed => write!(f, "VMI_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One evaluator's verdict: a state plus optional advisory text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateRecord {
    /// The lifecycle state
    pub state: LifecycleState,

    /// Short advisory shown next to the state
    pub message: Option<String>,

    /// Longer diagnostic detail (condition or pod text)
    pub detailed_message: Option<String>,
}

impl StateRecord {
    /// Create a record with no messages
    pub fn new(state: LifecycleState) -> Self {
        Self {
            state,
            message: None,
            detailed_message: None,
        }
    }

    /// Set the advisory message and return self for chaining
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the diagnostic detail and return self for chaining
    pub fn detailed_message(mut self, detail: impl Into<String>) -> Self {
        self.detailed_message = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_dashboard_tokens() {
        assert_eq!(LifecycleState::VmError.to_string(), "VM error");
        assert_eq!(LifecycleState::NotReady.to_string(), "Not Ready");
        assert_eq!(LifecycleState::Off.to_string(), "Off");
        assert_eq!(LifecycleState::InstanceError.to_string(), "Instance error");
        assert_eq!(LifecycleState::InstanceWaiting.to_string(), "VMI_WAITING");
        assert_eq!(LifecycleState::InstanceFailed.to_string(), "VMI_ERROR");
        assert_eq!(LifecycleState::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_migrating_displays_raw_status() {
        let state = LifecycleState::Migrating("PreparingTarget".to_string());
        assert_eq!(state.to_string(), "PreparingTarget");
    }

    #[test]
    fn test_error_bucket() {
        assert!(LifecycleState::VmError.is_error());
        assert!(!LifecycleState::InstanceError.is_error());
        assert!(!LifecycleState::Unschedulable.is_error());
    }

    #[test]
    fn test_warning_bucket() {
        for state in [
            LifecycleState::Stopping,
            LifecycleState::Waiting,
            LifecycleState::Pending,
            LifecycleState::Starting,
            LifecycleState::Terminating,
        ] {
            assert!(state.is_warning(), "{state} should be a warning");
        }
        assert!(!LifecycleState::Running.is_warning());
        assert!(!LifecycleState::Off.is_warning());
        // The raw fallback tokens stay out of both buckets
        assert!(!LifecycleState::InstanceWaiting.is_warning());
        assert!(!LifecycleState::Unknown.is_warning());
    }

    #[test]
    fn test_record_builder() {
        let record = StateRecord::new(LifecycleState::Starting)
            .message(STARTING_MESSAGE)
            .detailed_message("container image still pulling");
        assert_eq!(record.state, LifecycleState::Starting);
        assert_eq!(record.message.as_deref(), Some(STARTING_MESSAGE));
        assert_eq!(
            record.detailed_message.as_deref(),
            Some("container image still pulling")
        );
    }
}
