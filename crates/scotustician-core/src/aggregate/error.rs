//! Per-case aggregation errors. These are data-integrity diagnostics,
//! never fatal to the run.

use thiserror::Error;

/// Why a single case's sections could not be aggregated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// Case has zero sections. Should not occur under the input
    /// invariant; excluded with a warning, not a hard failure.
    #[error("Case has no sections")]
    EmptyCase,

    /// A section carried an empty embedding vector.
    #[error("Section {section_index} has an empty embedding vector")]
    EmptyVector { section_index: u32 },

    /// Sections of one case disagree on vector dimension.
    #[error(
        "Inconsistent vector dimensions within case: expected {expected}, got {actual} at section {section_index}"
    )]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        section_index: u32,
    },

    /// Token count violates the strictly-positive invariant.
    #[error("Section {section_index} has non-positive token count")]
    InvalidTokenCount { section_index: u32 },
}
