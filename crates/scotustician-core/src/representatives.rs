//! Cluster representative selection and nearest-neighbor ranking.
//!
//! Both the centroid and all similarity ranking run in the original
//! high-dimensional embedding space, not the 2D projection — the
//! projection is for plotting, the embeddings are for fidelity. The
//! metric is cosine throughout (distance = 1 − similarity), consistent
//! between representative selection and neighbor ranking.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::similarity::{cosine_distance, rank_neighbors, RankedCase};
use crate::types::{
    CaseVector, ClusterAssignment, ClusterLabel, ClusterRepresentative, NeighborScope,
};

/// Select one representative per non-noise cluster with its top
/// `neighbor_count` nearest neighbors.
///
/// The representative is the member whose case vector is closest (by
/// cosine distance) to the centroid of its cluster's vectors. Neighbors
/// are ranked over the population `scope` selects, always excluding the
/// representative itself; ties break by case id ascending, so output is
/// deterministic for a fixed clustering.
///
/// An all-noise clustering produces an empty vec — a valid outcome, not
/// an error. `assignments` whose case id has no matching vector are
/// skipped with a warning.
pub fn select_representatives(
    cases: &[CaseVector],
    assignments: &[ClusterAssignment],
    scope: NeighborScope,
    neighbor_count: usize,
) -> Vec<ClusterRepresentative> {
    let by_id: BTreeMap<&str, &CaseVector> =
        cases.iter().map(|c| (c.case_id.as_str(), c)).collect();

    // Members per cluster, in ascending label order for determinism.
    let mut clusters: BTreeMap<u32, Vec<&CaseVector>> = BTreeMap::new();
    for assignment in assignments {
        let ClusterLabel::Cluster(label) = assignment.label else {
            continue;
        };
        match by_id.get(assignment.case_id.as_str()) {
            Some(case) => clusters.entry(label).or_default().push(case),
            None => warn!(
                case_id = %assignment.case_id,
                "Cluster assignment references unknown case; skipping"
            ),
        }
    }

    let mut representatives = Vec::with_capacity(clusters.len());

    for (label, mut members) in clusters {
        members.sort_by(|a, b| a.case_id.cmp(&b.case_id));

        let Some(centroid) = centroid_of(&members) else {
            warn!(cluster = label, "Cluster has no usable members; skipping");
            continue;
        };

        // Closest member to the centroid; ties resolved by the ascending
        // case-id iteration order together with strict improvement.
        let mut representative: Option<(&CaseVector, f32)> = None;
        for member in &members {
            match cosine_distance(&member.vector, &centroid) {
                Ok(dist) => {
                    if representative.map_or(true, |(_, best)| dist < best) {
                        representative = Some((member, dist));
                    }
                }
                Err(e) => warn!(
                    case_id = %member.case_id,
                    cluster = label,
                    error = %e,
                    "Skipping member in representative selection"
                ),
            }
        }

        let Some((rep, rep_dist)) = representative else {
            warn!(
                cluster = label,
                "No member had a computable centroid distance; skipping cluster"
            );
            continue;
        };

        let candidates: Vec<RankedCase<'_>> = match scope {
            NeighborScope::AllCases => cases
                .iter()
                .filter(|c| c.case_id != rep.case_id)
                .map(|c| RankedCase {
                    case_id: &c.case_id,
                    vector: &c.vector,
                })
                .collect(),
            NeighborScope::WithinCluster => members
                .iter()
                .filter(|c| c.case_id != rep.case_id)
                .map(|c| RankedCase {
                    case_id: &c.case_id,
                    vector: &c.vector,
                })
                .collect(),
        };

        let neighbors = rank_neighbors(&rep.vector, &candidates, neighbor_count);

        info!(
            cluster = label,
            representative = %rep.case_id,
            centroid_distance = rep_dist,
            neighbors = neighbors.len(),
            "Selected cluster representative"
        );

        representatives.push(ClusterRepresentative {
            cluster_label: label,
            case_id: rep.case_id.clone(),
            neighbors,
        });
    }

    representatives
}

/// Elementwise mean of member vectors; `None` if there are no members or
/// dimensions disagree (cannot happen for aggregator output, checked
/// anyway).
fn centroid_of(members: &[&CaseVector]) -> Option<Vec<f32>> {
    let first = members.first()?;
    let dim = first.vector.len();
    let mut sum = vec![0.0f64; dim];

    for member in members {
        if member.vector.len() != dim {
            warn!(
                case_id = %member.case_id,
                "Dimension mismatch inside cluster; centroid unavailable"
            );
            return None;
        }
        for (acc, &v) in sum.iter_mut().zip(member.vector.iter()) {
            *acc += v as f64;
        }
    }

    let inv = 1.0 / members.len() as f64;
    Some(sum.into_iter().map(|v| (v * inv) as f32).collect())
}
