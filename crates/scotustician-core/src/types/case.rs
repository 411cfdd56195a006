//! Case-level derived records: aggregated vectors, 2D projections, and
//! cluster assignments.

use serde::{Deserialize, Serialize};

/// One case, represented by the token-weighted mean of its section
/// embeddings.
///
/// Produced by [`crate::aggregate`]; immutable once computed. A case with
/// a single section carries that section's vector unchanged. The vector is
/// NOT unit-normalized — downstream similarity uses cosine, which is
/// invariant to magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseVector {
    pub case_id: String,
    pub case_name: String,
    pub term: String,
    /// Token-weighted mean of the case's section vectors.
    pub vector: Vec<f32>,
    /// Sum of token counts across sections.
    pub total_tokens: u64,
    /// Number of sections that contributed to the mean.
    pub section_count: u32,
}

impl CaseVector {
    /// Embedding dimension of this case's vector.
    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

/// 2D t-SNE coordinate for one case; 1:1 with [`CaseVector`] by `case_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub case_id: String,
    pub x: f32,
    pub y: f32,
}

/// Cluster label for one case.
///
/// Labels are opaque, discovery-order identifiers with no meaning beyond
/// grouping, and are NOT stable across runs — density clustering assigns
/// numbers in the order clusters are found. Consumers must never compare
/// labels between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Point not assigned to any dense region.
    Noise,
    /// Member of the dense cluster with this (opaque) id.
    Cluster(u32),
}

impl ClusterLabel {
    /// Whether this label is the noise sentinel.
    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }

    /// Integer form used in the tabular export: noise is `-1`, clusters
    /// are their non-negative id. Matches the HDBSCAN convention the
    /// downstream viewer expects.
    pub fn as_i64(&self) -> i64 {
        match self {
            ClusterLabel::Noise => -1,
            ClusterLabel::Cluster(id) => *id as i64,
        }
    }
}

/// Cluster membership for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub case_id: String,
    pub label: ClusterLabel,
}
