//! Cluster exemplar records produced by representative selection.

use serde::{Deserialize, Serialize};

/// A case ranked by similarity to a cluster representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub case_id: String,
    /// Cosine similarity to the representative's case vector, in [-1, 1].
    pub similarity: f32,
}

/// The exemplar for one non-noise cluster: the member closest to the
/// cluster centroid in the original embedding space, with its top
/// nearest neighbors by cosine similarity.
///
/// Written once per pipeline run; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRepresentative {
    pub cluster_label: u32,
    pub case_id: String,
    /// Up to 5 neighbors, descending similarity, ties broken by
    /// `case_id` ascending.
    pub neighbors: Vec<Neighbor>,
}

/// Which population nearest neighbors are drawn from.
///
/// Cross-cluster similarity is informative, so the default ranks the
/// entire case set; `WithinCluster` restricts ranking to the
/// representative's own cluster members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborScope {
    /// Rank all other cases in the run, regardless of cluster.
    #[default]
    AllCases,
    /// Rank only the other members of the representative's cluster.
    WithinCluster,
}
