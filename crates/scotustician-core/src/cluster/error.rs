//! Error types for density clustering.

use thiserror::Error;

/// Errors from the density clusterer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// Invalid clustering parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ClusterError {
    /// Create an `InvalidParameter` error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        ClusterError::InvalidParameter(msg.into())
    }
}
