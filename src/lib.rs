//! Virtlens - status reconciliation engine for KubeVirt-style virtual machines
//!
//! Virtlens derives the effective lifecycle state of a virtual machine from
//! the resources that describe it: the VirtualMachine itself, its runtime
//! instance, the launcher pod, any in-flight restore operation, and the
//! namespace quota. The control plane scatters that truth across objects;
//! the engine fuses it into one state per machine, plus the advisory
//! channels (warnings, migration failures, restore progress) shown next
//! to it.
//!
//! # Architecture
//!
//! The engine is a pure function over a [`store::Snapshot`]:
//! - Watchers feed the snapshot; nothing in the engine talks to a cluster
//! - Per machine, independent evaluators each inspect the view and offer a
//!   verdict; a fixed precedence order picks the first that applies
//! - The observer binary wraps the engine in a kube controller loop that
//!   only logs what it sees
//!
//! # Modules
//!
//! - [`crd`] - Typed declarations of the watched resources
//! - [`store`] - Indexed snapshot of cluster state + per-machine views
//! - [`status`] - The status fusion engine (evaluators, resolver, advisories)
//! - [`controller`] - Read-only observer reconciliation loop
//! - [`error`] - Error types for the parse seams and the observer

#![deny(missing_docs)]

pub mod controller;
pub mod crd;
pub mod error;
pub mod status;
pub mod store;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default interval in seconds between periodic re-evaluations of a machine
pub const DEFAULT_REQUEUE_SECS: u64 = 30;

/// Delay in seconds before retrying a failed reconciliation
pub const ERROR_REQUEUE_SECS: u64 = 5;
