//! Deterministic top-k neighbor ranking by cosine similarity.

use tracing::warn;

use super::primitives::cosine_similarity;
use crate::types::Neighbor;

/// A candidate case offered to [`rank_neighbors`].
#[derive(Debug, Clone)]
pub struct RankedCase<'a> {
    pub case_id: &'a str,
    pub vector: &'a [f32],
}

/// Rank `candidates` by cosine similarity to `reference` and return the
/// top `k` as [`Neighbor`] records.
///
/// Ordering is fully deterministic: descending similarity, ties broken by
/// `case_id` ascending. Candidates whose similarity cannot be computed
/// (zero magnitude, dimension mismatch) are skipped with a warning rather
/// than failing the ranking — a single malformed case must not abort the
/// run.
///
/// The caller is responsible for excluding the reference case itself from
/// `candidates` when self-matches are unwanted.
pub fn rank_neighbors(reference: &[f32], candidates: &[RankedCase<'_>], k: usize) -> Vec<Neighbor> {
    let mut scored: Vec<(f32, &str)> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match cosine_similarity(reference, candidate.vector) {
            Ok(sim) => scored.push((sim, candidate.case_id)),
            Err(e) => {
                warn!(
                    case_id = candidate.case_id,
                    error = %e,
                    "Skipping candidate in neighbor ranking"
                );
            }
        }
    }

    scored.sort_by(|(sim_a, id_a), (sim_b, id_b)| {
        sim_b
            .partial_cmp(sim_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| id_a.cmp(id_b))
    });

    scored
        .into_iter()
        .take(k)
        .map(|(similarity, case_id)| Neighbor {
            case_id: case_id.to_string(),
            similarity,
        })
        .collect()
}
