//! Run orchestration: the four stages in dependency order, then export.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use scotustician_core::aggregate::aggregate_cases;
use scotustician_core::cluster::{DensityClusterer, DensityParams};
use scotustician_core::params::{AnalysisParams, NEIGHBOR_COUNT};
use scotustician_core::reduce::{TsneParams, TsneReducer};
use scotustician_core::representatives::select_representatives;
use scotustician_core::types::{ClusterAssignment, ClusterLabel, ProjectedPoint};
use scotustician_storage::{EmbeddingStore, ResultStore};

use crate::bundle::{summarize, CaseRow, RunMetadata, RunParameters};
use crate::error::PipelineError;
use crate::export::export_bundle;

/// Outcome of a successful run, for the caller's success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_timestamp: String,
    pub case_count: usize,
    pub cluster_count: usize,
    pub noise_count: usize,
    /// Where the bundle landed.
    pub output_location: String,
}

/// Execute one full clustering run.
///
/// Stages run strictly in order — aggregate, reduce, cluster, select,
/// export — each consuming the previous stage's complete output. A
/// degenerate case set (fewer cases than the cluster-size floor)
/// completes normally with zero clusters and everything marked noise.
///
/// # Errors
///
/// Fatal failures ([`PipelineError`]) identify the failing stage. On any
/// fatal path no output bundle exists at the destination.
pub async fn run_analysis(
    store: &dyn EmbeddingStore,
    results: &dyn ResultStore,
    params: &AnalysisParams,
) -> Result<RunReport, PipelineError> {
    params.validate()?;

    let started = Utc::now();
    // Second-resolution stamp plus the nanosecond field, so back-to-back
    // runs never collide on a path.
    let run_timestamp = format!(
        "{}_{:09}",
        started.format("%Y%m%d_%H%M%S"),
        started.timestamp_subsec_nanos()
    );
    info!(
        run_timestamp = %run_timestamp,
        ?params.term_range,
        perplexity = params.perplexity,
        min_cluster_size = params.min_cluster_size,
        random_seed = params.random_seed,
        "Starting case clustering analysis"
    );

    // Stage 1: aggregate section embeddings into case vectors.
    let stage = Instant::now();
    let sections = store.fetch_sections(&params.term_range).await?;
    let cases = aggregate_cases(sections, &params.term_range);
    if cases.is_empty() {
        return Err(PipelineError::NoCases);
    }
    info!(
        cases = cases.len(),
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Aggregation complete"
    );

    // Stage 2: project to 2D. A single case cannot be embedded; it
    // degrades to the origin and noise rather than failing the run.
    let stage = Instant::now();
    let points: Vec<ProjectedPoint> = if cases.len() < 2 {
        warn!("Only one case in range; skipping t-SNE and labeling it noise");
        cases
            .iter()
            .map(|c| ProjectedPoint {
                case_id: c.case_id.clone(),
                x: 0.0,
                y: 0.0,
            })
            .collect()
    } else {
        let reducer = TsneReducer::new(
            TsneParams::default()
                .with_perplexity(params.perplexity)
                .with_seed(params.random_seed),
        );
        reducer.project(&cases)?
    };
    info!(
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Reduction complete"
    );

    // Stage 3: density clustering in the projected plane.
    let stage = Instant::now();
    let assignments: Vec<ClusterAssignment> = if cases.len() < 2 {
        points
            .iter()
            .map(|p| ClusterAssignment {
                case_id: p.case_id.clone(),
                label: ClusterLabel::Noise,
            })
            .collect()
    } else {
        let clusterer =
            DensityClusterer::new(DensityParams::with_min_cluster_size(params.min_cluster_size));
        clusterer.fit(&points)?
    };
    info!(
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Clustering complete"
    );

    // Stage 4: representatives and neighbors in the embedding space.
    let stage = Instant::now();
    let representatives =
        select_representatives(&cases, &assignments, params.neighbor_scope, NEIGHBOR_COUNT);
    info!(
        representatives = representatives.len(),
        elapsed_ms = stage.elapsed().as_millis() as u64,
        "Representative selection complete"
    );

    // Join stage outputs into the tabular rows. All three collections are
    // 1:1 by construction.
    let labels: HashMap<&str, ClusterLabel> = assignments
        .iter()
        .map(|a| (a.case_id.as_str(), a.label))
        .collect();
    let rows: Vec<CaseRow> = cases
        .iter()
        .zip(points.iter())
        .map(|(case, point)| {
            let label = labels
                .get(case.case_id.as_str())
                .copied()
                .unwrap_or(ClusterLabel::Noise);
            CaseRow::from_parts(case, point, label)
        })
        .collect();

    let summary = summarize(&rows);
    let metadata = RunMetadata {
        run_timestamp: run_timestamp.clone(),
        parameters: RunParameters {
            perplexity: params.perplexity,
            min_cluster_size: params.min_cluster_size,
            random_seed: params.random_seed,
            start_term: params.term_range.start.clone(),
            end_term: params.term_range.end.clone(),
        },
        summary: summary.clone(),
        representatives,
    };

    // Stage 5: export, all-or-nothing with bounded retries.
    let output_location = export_bundle(results, &rows, &metadata).await?;

    info!(
        run_timestamp = %run_timestamp,
        cases = summary.case_count,
        clusters = summary.cluster_count,
        noise = summary.noise_count,
        location = %output_location,
        "Analysis completed successfully"
    );

    Ok(RunReport {
        run_timestamp,
        case_count: summary.case_count,
        cluster_count: summary.cluster_count,
        noise_count: summary.noise_count,
        output_location,
    })
}
