//! Error types for the virtlens observer

use thiserror::Error;

/// Main error type for virtlens operations
///
/// The status engine itself is infallible by design: absent or malformed
/// upstream signals degrade to "not applicable" instead of erroring. These
/// variants cover the layers around the engine — the Kubernetes watch loop,
/// CRD schema dumps, and strict parsing of control-plane enum strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Validation error for control-plane field values
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
