//! Result store trait and the filesystem implementation.
//!
//! The result store is the durable hand-off point to the visualization
//! collaborator. A bundle write is all-or-nothing: either every artifact
//! appears under the run path, or nothing does.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StorageError;

/// One serialized output file within a run's bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name within the run directory, e.g. `"results.csv"`.
    pub name: String,
    /// Serialized contents.
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Create an artifact from a name and contents.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Durable, atomic bundle writes.
///
/// Implementations must guarantee that a failed `write_bundle` leaves no
/// partial artifact visible at `run_path`.
pub trait ResultStore: Send + Sync {
    /// Write every artifact under `run_path` atomically.
    ///
    /// Returns a human-readable location of the written bundle.
    ///
    /// # Errors
    ///
    /// `StorageError::WriteFailed` on any I/O failure; the destination is
    /// left without partial output.
    fn write_bundle(&self, run_path: &str, artifacts: &[Artifact]) -> Result<String, StorageError>;
}

/// Filesystem-backed result store.
///
/// Stages the bundle into a hidden temp directory next to the final run
/// path, then renames it into place once every artifact is written —
/// rename is the commit point, so readers never observe a half-written
/// bundle.
#[derive(Debug, Clone)]
pub struct FsResultStore {
    root: PathBuf,
}

impl FsResultStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResultStore for FsResultStore {
    fn write_bundle(&self, run_path: &str, artifacts: &[Artifact]) -> Result<String, StorageError> {
        let final_dir = self.root.join(run_path);
        if final_dir.exists() {
            return Err(StorageError::WriteFailed {
                path: final_dir.display().to_string(),
                message: "run path already exists; bundles are immutable".to_string(),
            });
        }

        let parent = final_dir.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| write_failed(parent, e))?;

        // Stage next to the destination so the rename stays on one
        // filesystem.
        let stage_name = format!(
            ".staging-{}",
            final_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "bundle".to_string())
        );
        let stage_dir = parent.join(stage_name);
        if stage_dir.exists() {
            fs::remove_dir_all(&stage_dir).map_err(|e| write_failed(&stage_dir, e))?;
        }
        fs::create_dir_all(&stage_dir).map_err(|e| write_failed(&stage_dir, e))?;

        let result = (|| -> Result<(), StorageError> {
            for artifact in artifacts {
                let path = stage_dir.join(&artifact.name);
                debug!(path = %path.display(), bytes = artifact.bytes.len(), "Staging artifact");
                fs::write(&path, &artifact.bytes).map_err(|e| write_failed(&path, e))?;
            }
            fs::rename(&stage_dir, &final_dir).map_err(|e| write_failed(&final_dir, e))
        })();

        if result.is_err() {
            // Leave no partial state behind; the original error wins.
            let _ = fs::remove_dir_all(&stage_dir);
            result?;
        }

        info!(
            path = %final_dir.display(),
            artifacts = artifacts.len(),
            "Wrote analysis bundle"
        );
        Ok(final_dir.display().to_string())
    }
}

fn write_failed(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
