//! Pipeline error taxonomy.
//!
//! Every fatal failure names the stage it came from, so the operator can
//! tell a dead database from a bad export destination without reading
//! logs.

use thiserror::Error;

use scotustician_core::cluster::ClusterError;
use scotustician_core::params::ParamsError;
use scotustician_core::reduce::ReduceError;
use scotustician_storage::StorageError;

/// Errors from writing the result bundle.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Metadata could not be serialized. Indicates a bug, not an I/O
    /// problem.
    #[error("Failed to serialize metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    /// All write attempts failed; the computed results were not
    /// persisted anywhere.
    #[error("Export failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last_error: StorageError,
    },
}

/// Top-level error for a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid run parameters, rejected before any work.
    #[error("Parameter validation failed: {0}")]
    Params(#[from] ParamsError),

    /// Embedding-store read failed (connectivity; fatal, no partial
    /// output exists yet).
    #[error("Embedding store stage failed: {0}")]
    Storage(#[from] StorageError),

    /// The term range matched no cases at all.
    #[error("No case embeddings found for the requested term range")]
    NoCases,

    /// Dimensionality reduction failed.
    #[error("Reduction stage failed: {0}")]
    Reduce(#[from] ReduceError),

    /// Clustering failed (parameter errors only; degenerate input is not
    /// an error).
    #[error("Clustering stage failed: {0}")]
    Cluster(#[from] ClusterError),

    /// Export failed after retries; no bundle was written.
    #[error("Export stage failed: {0}")]
    Export(#[from] ExportError),
}
