//! Error types for dimensionality reduction.

use thiserror::Error;

/// Errors from the t-SNE reducer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// Too few cases to embed; t-SNE needs at least 2 points.
    #[error("Insufficient data: need at least {required} cases, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Case vectors disagree on embedding dimension across cases.
    /// Indicates mixed embedding models in one run.
    #[error("Case vector dimension mismatch: expected {expected}, got {actual} for case '{case_id}'")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        case_id: String,
    },

    /// Invalid reducer parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
