//! Shared vocabulary for the watched resource types
//!
//! Conditions, run strategies, instance phases, and state-change requests as
//! reported by a KubeVirt-style control plane. Everything here is read-only
//! input to the status engine; wire decoding never rejects a value outside
//! the known vocabulary, only config-style `FromStr` parsing does.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reported when a VM or instance has failed
pub const CONDITION_FAILURE: &str = "Failure";
/// Condition type reporting instance readiness
pub const CONDITION_READY: &str = "Ready";
/// Condition type present while an instance is paused
pub const CONDITION_PAUSED: &str = "Paused";
/// Condition type reporting guest-agent connectivity
pub const CONDITION_AGENT_CONNECTED: &str = "AgentConnected";
/// Condition type set when a spec change needs a restart to take effect
pub const CONDITION_RESTART_REQUIRED: &str = "RestartRequired";
/// Condition reason used by the scheduler when placement fails
pub const REASON_UNSCHEDULABLE: &str = "Unschedulable";

/// Migration status string that marks a migration as failed
pub const MIGRATION_STATUS_FAILED: &str = "Failed";

/// Condition status following Kubernetes conventions
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition attached to a VM, instance, or image
///
/// Reason, message, and the transition timestamp are all optional because
/// the upstream controllers populate them inconsistently; an absent field is
/// a missing signal, never an error.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., Ready, Failure, Paused)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    #[serde(default)]
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(type_: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: None,
            message: None,
            last_transition_time: Some(Utc::now()),
        }
    }

    /// Set the reason and return self for chaining
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the message and return self for chaining
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Find a condition by type in a (possibly absent) condition list
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Returns true if the condition of the given type exists with status True
pub fn condition_is_true(conditions: &[Condition], type_: &str) -> bool {
    find_condition(conditions, type_)
        .map(|c| c.status == ConditionStatus::True)
        .unwrap_or(false)
}

/// Declarative policy controlling whether a VM's instance should exist
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunStrategy {
    /// Instance should always exist; restarted on exit
    Always,
    /// Instance is restarted only after a failure exit
    RerunOnFailure,
    /// No instance should exist
    Halted,
    /// Start/stop driven entirely by explicit state-change requests
    Manual,
    /// Any strategy this engine does not interpret
    #[serde(other)]
    Unrecognized,
}

impl std::str::FromStr for RunStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Always" => Ok(Self::Always),
            "RerunOnFailure" => Ok(Self::RerunOnFailure),
            "Halted" => Ok(Self::Halted),
            "Manual" => Ok(Self::Manual),
            _ => Err(crate::Error::validation(format!(
                "invalid run strategy: {s}, expected one of: Always, RerunOnFailure, Halted, Manual"
            ))),
        }
    }
}

impl std::fmt::Display for RunStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::RerunOnFailure => write!(f, "RerunOnFailure"),
            Self::Halted => write!(f, "Halted"),
            Self::Manual => write!(f, "Manual"),
            Self::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Action requested through the control plane's start/stop sub-resources
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateChangeAction {
    /// Request the instance to be started
    Start,
    /// Request the instance to be stopped
    Stop,
    /// Any action this engine does not interpret
    #[serde(other)]
    Unrecognized,
}

impl std::fmt::Display for StateChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Stop => write!(f, "Stop"),
            Self::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Pending start/stop request recorded on the VM status
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeRequest {
    /// Requested action
    pub action: StateChangeAction,

    /// UID of the instance the request applies to, when scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Lifecycle phase reported on a live instance
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum InstancePhase {
    /// Instance accepted but resources not yet committed
    Pending,
    /// Scheduler is placing the instance
    Scheduling,
    /// Instance placed on a node, not yet running
    Scheduled,
    /// Guest is running
    Running,
    /// Guest exited cleanly
    Succeeded,
    /// Guest exited with a failure
    Failed,
    /// Phase cannot be determined
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Scheduling => write!(f, "Scheduling"),
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Live migration state reported on an instance
///
/// The raw status string is surfaced verbatim while a migration is in
/// flight; only the `Failed` terminal value gets special treatment.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    /// Coarse migration status as published by the migration controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Human-readable detail about the migration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MigrationState {
    /// Returns true if the migration ended in failure
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some(MIGRATION_STATUS_FAILED)
    }
}
