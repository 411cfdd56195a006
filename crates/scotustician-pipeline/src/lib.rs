//! Scotustician Pipeline
//!
//! Orchestration of the case-clustering batch run: aggregate section
//! embeddings, project to 2D, cluster, select representatives, export.
//!
//! One invocation processes one term-range request and exits; there is
//! no overlap between runs and no shared mutable state across stage
//! boundaries. Each stage consumes the prior stage's complete output.
//!
//! The user-visible contract: a run either produces a complete,
//! consistent output bundle at a fresh timestamped path, or produces no
//! bundle at all and fails with a diagnostic naming the stage.

mod bundle;
mod error;
mod export;
mod run;

pub use bundle::{CaseRow, RunMetadata, RunParameters, RunSummary};
pub use error::{ExportError, PipelineError};
pub use export::{export_bundle, ANALYSIS_PREFIX, MAX_WRITE_ATTEMPTS};
pub use run::{run_analysis, RunReport};
