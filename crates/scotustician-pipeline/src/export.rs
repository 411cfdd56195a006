//! Bundle export with bounded retries.
//!
//! Everything is serialized in memory before the first byte hits the
//! result store, so a failed write never discards computed results
//! silently and never leaves a partial bundle (atomicity is the store's
//! contract; retrying is ours).

use std::time::Duration;

use tracing::{info, warn};

use scotustician_storage::{Artifact, ResultStore, StorageError};

use crate::bundle::{render_csv, CaseRow, RunMetadata};
use crate::error::ExportError;

/// Path namespace for this analysis type under the output prefix.
pub const ANALYSIS_PREFIX: &str = "case-clustering";

/// Bounded write attempts before a run fails.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

const RESULTS_FILE: &str = "results.csv";
const METADATA_FILE: &str = "metadata.json";

/// Serialize and write the full bundle for one run.
///
/// The run path is `case-clustering/<run_timestamp>`; timestamps carry a
/// nanosecond component, so repeated runs land at distinct paths and
/// never overwrite each other.
///
/// # Errors
///
/// - `ExportError::Serialization` if metadata cannot be encoded (a bug)
/// - `ExportError::RetriesExhausted` after [`MAX_WRITE_ATTEMPTS`] failed
///   writes; the destination holds no partial output
pub async fn export_bundle(
    store: &dyn ResultStore,
    rows: &[CaseRow],
    metadata: &RunMetadata,
) -> Result<String, ExportError> {
    let csv = render_csv(rows);
    let json = serde_json::to_vec_pretty(metadata)?;
    let artifacts = [
        Artifact::new(RESULTS_FILE, csv.into_bytes()),
        Artifact::new(METADATA_FILE, json),
    ];
    let run_path = format!("{ANALYSIS_PREFIX}/{}", metadata.run_timestamp);

    let mut last_error: Option<StorageError> = None;
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        match store.write_bundle(&run_path, &artifacts) {
            Ok(location) => {
                info!(attempt, location = %location, "Bundle export complete");
                return Ok(location);
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = MAX_WRITE_ATTEMPTS,
                    error = %e,
                    "Bundle write attempt failed"
                );
                last_error = Some(e);
                if attempt < MAX_WRITE_ATTEMPTS {
                    // Backoff must not block the runtime worker thread.
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
            }
        }
    }

    Err(ExportError::RetriesExhausted {
        attempts: MAX_WRITE_ATTEMPTS,
        last_error: last_error
            .unwrap_or_else(|| StorageError::Internal("no attempt recorded".to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use scotustician_storage::FsResultStore;

    use crate::bundle::{summarize, RunParameters};

    fn metadata(stamp: &str) -> RunMetadata {
        RunMetadata {
            run_timestamp: stamp.to_string(),
            parameters: RunParameters {
                perplexity: 30,
                min_cluster_size: 5,
                random_seed: 42,
                start_term: None,
                end_term: None,
            },
            summary: summarize(&[]),
            representatives: vec![],
        }
    }

    /// Store that fails the first `failures` writes, then delegates.
    struct FlakyStore {
        inner: FsResultStore,
        failures: usize,
        attempts: AtomicUsize,
    }

    impl ResultStore for FlakyStore {
        fn write_bundle(
            &self,
            run_path: &str,
            artifacts: &[Artifact],
        ) -> Result<String, StorageError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                return Err(StorageError::WriteFailed {
                    path: run_path.to_string(),
                    message: format!("injected failure {attempt}"),
                });
            }
            self.inner.write_bundle(run_path, artifacts)
        }
    }

    #[tokio::test]
    async fn writes_csv_and_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = FsResultStore::new(tmp.path());

        let location = export_bundle(&store, &[], &metadata("20240101_000000_0"))
            .await
            .unwrap();
        let dir = std::path::PathBuf::from(location);
        assert!(dir.join("results.csv").is_file());

        let json = std::fs::read_to_string(dir.join("metadata.json")).unwrap();
        let parsed: RunMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.parameters.perplexity, 30);
        assert!(parsed.representatives.is_empty(), "empty set serializes as []");
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let tmp = TempDir::new().unwrap();
        let store = FlakyStore {
            inner: FsResultStore::new(tmp.path()),
            failures: 2,
            attempts: AtomicUsize::new(0),
        };

        let result = export_bundle(&store, &[], &metadata("20240101_000000_1")).await;
        assert!(result.is_ok(), "third attempt must succeed");
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = FlakyStore {
            inner: FsResultStore::new(tmp.path()),
            failures: usize::MAX,
            attempts: AtomicUsize::new(0),
        };

        let result = export_bundle(&store, &[], &metadata("20240101_000000_2")).await;
        assert!(matches!(
            result,
            Err(ExportError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_WRITE_ATTEMPTS);
    }
}
