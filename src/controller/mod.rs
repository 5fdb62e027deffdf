//! Observer loop over watched VirtualMachines
//!
//! This module contains the read-only reconciliation logic: machines are
//! evaluated against the snapshot on every pass and the results are logged,
//! never written back to the cluster.

mod vm;

pub use vm::{error_policy, reconcile, Context, SnapshotSource, SnapshotSourceImpl};
