//! Storage error types.
//!
//! Connectivity errors are fatal to a run; they are never retried at the
//! per-case level because a dead store fails identically for every case.

use thiserror::Error;

/// Errors from embedding-store reads and result-store writes.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not reach the embedding store.
    #[error("Failed to connect to embedding store at '{target}': {message}")]
    ConnectionFailed {
        /// Redacted connection target (host/database, no credentials).
        target: String,
        /// Underlying driver message.
        message: String,
    },

    /// A read query against the embedding store failed.
    #[error("Embedding store query failed: {0}")]
    QueryFailed(String),

    /// A row could not be decoded into a typed record.
    #[error("Malformed row for case '{case_id}': {reason}")]
    MalformedRow { case_id: String, reason: String },

    /// A write to the result store failed.
    #[error("Result store write failed at '{path}': {message}")]
    WriteFailed { path: String, message: String },

    /// Generic internal error for unexpected failures.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(e: tokio_postgres::Error) -> Self {
        StorageError::QueryFailed(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Internal(e.to_string())
    }
}
