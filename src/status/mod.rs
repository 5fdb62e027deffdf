//! Status fusion engine
//!
//! Turns the raw signals of a machine and its satellites into exactly one
//! lifecycle state plus advisories. The pipeline: the expectation resolver
//! answers whether the machine should run, the condition evaluators each
//! judge one aspect, and the precedence resolver picks the single winning
//! verdict. The fleet aggregator folds resolved states into summary counts,
//! and the image engine does the same job for images on a smaller scale.

pub mod advisory;
pub mod evaluators;
pub mod expectation;
pub mod fleet;
pub mod image;
pub mod pod;
pub mod resolver;
pub mod state;

pub use advisory::{
    migration_message, restore_complete, restore_progress, state_description, warning_message,
    RestoreProgress, Warning, WarningSource,
};
pub use expectation::expected_running;
pub use fleet::{fleet_status, FleetStatus};
pub use image::{image_error, image_message, image_state, is_ready, ImageState};
pub use pod::{classify, PodStatus, PodSummary};
pub use resolver::{resolve, resolve_state, Evaluator, WATERFALL};
pub use state::{LifecycleState, StateRecord};
