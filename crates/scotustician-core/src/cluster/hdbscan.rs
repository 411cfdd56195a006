//! HDBSCAN-style density clustering over 2D projected points.
//!
//! # Algorithm
//!
//! 1. Compute core distances (distance to the k-th nearest neighbor)
//! 2. Build the mutual reachability graph:
//!    `MR(a,b) = max(core_dist(a), core_dist(b), dist(a,b))`
//! 3. Construct a minimum spanning tree with Prim's algorithm
//! 4. Merge components with union-find up to a data-driven edge-weight
//!    gap threshold; components smaller than `min_cluster_size` are noise
//!
//! Cluster label numbering is discovery-order and therefore NOT stable
//! across runs — an inherent property of density clustering, documented
//! on [`crate::types::ClusterLabel`]. Consumers treat labels as opaque.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::ClusterError;
use crate::types::{ClusterAssignment, ClusterLabel, ProjectedPoint};

/// Parameters for density clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityParams {
    /// Hard floor on cluster membership: any density region smaller than
    /// this is relabeled as noise.
    pub min_cluster_size: usize,
    /// Neighbors required for a point's core distance.
    /// Must be <= min_cluster_size.
    pub min_samples: usize,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            min_samples: 2,
        }
    }
}

impl DensityParams {
    /// Params with the given cluster-size floor and default min_samples.
    pub fn with_min_cluster_size(size: usize) -> Self {
        Self {
            min_cluster_size: size,
            min_samples: 2.min(size.saturating_sub(1)).max(1),
        }
    }

    /// Validate parameters, failing fast with descriptive messages.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if:
    /// - min_cluster_size < 2
    /// - min_samples < 1
    /// - min_samples > min_cluster_size
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.min_cluster_size < 2 {
            return Err(ClusterError::invalid_parameter(format!(
                "min_cluster_size must be >= 2, got {}",
                self.min_cluster_size
            )));
        }
        if self.min_samples < 1 {
            return Err(ClusterError::invalid_parameter(format!(
                "min_samples must be >= 1, got {}",
                self.min_samples
            )));
        }
        if self.min_samples > self.min_cluster_size {
            return Err(ClusterError::invalid_parameter(format!(
                "min_samples ({}) must be <= min_cluster_size ({})",
                self.min_samples, self.min_cluster_size
            )));
        }
        Ok(())
    }
}

/// Density clusterer for the batch of projected points.
pub struct DensityClusterer {
    params: DensityParams,
}

impl DensityClusterer {
    /// Create a clusterer with the given parameters.
    pub fn new(params: DensityParams) -> Self {
        Self { params }
    }

    /// Create a clusterer with default parameters.
    pub fn with_defaults() -> Self {
        Self::new(DensityParams::default())
    }

    /// Assign a [`ClusterLabel`] to every point.
    ///
    /// Fewer points than `min_cluster_size` is a valid degenerate input:
    /// every point is labeled noise and the run continues. An output
    /// where everything is noise is likewise valid.
    pub fn fit(&self, points: &[ProjectedPoint]) -> Result<Vec<ClusterAssignment>, ClusterError> {
        self.params.validate()?;

        let n = points.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        if n < self.params.min_cluster_size {
            warn!(
                n_points = n,
                min_cluster_size = self.params.min_cluster_size,
                "Fewer points than the cluster-size floor; labeling everything noise"
            );
            return Ok(points
                .iter()
                .map(|p| ClusterAssignment {
                    case_id: p.case_id.clone(),
                    label: ClusterLabel::Noise,
                })
                .collect());
        }

        let core_distances = self.compute_core_distances(points);
        let mutual_reach = self.compute_mutual_reachability(points, &core_distances);
        let mst = build_mst(&mutual_reach);
        let labels = self.extract_clusters(&mst, n);

        let cluster_count = labels
            .iter()
            .filter_map(|l| match l {
                ClusterLabel::Cluster(id) => Some(*id),
                ClusterLabel::Noise => None,
            })
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        let noise_count = labels.iter().filter(|l| l.is_noise()).count();
        info!(
            n_points = n,
            clusters = cluster_count,
            noise = noise_count,
            "Density clustering complete"
        );

        Ok(points
            .iter()
            .zip(labels)
            .map(|(p, label)| ClusterAssignment {
                case_id: p.case_id.clone(),
                label,
            })
            .collect())
    }

    /// Core distance: distance to the k-th nearest neighbor.
    fn compute_core_distances(&self, points: &[ProjectedPoint]) -> Vec<f32> {
        let k = self.params.min_samples;
        let n = points.len();
        let mut core_distances = Vec::with_capacity(n);

        for i in 0..n {
            let mut distances: Vec<f32> = (0..n)
                .filter(|&j| j != i)
                .map(|j| euclidean_2d(&points[i], &points[j]))
                .collect();
            distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let core_dist = if k <= distances.len() {
                distances[k - 1]
            } else {
                distances.last().copied().unwrap_or(f32::MAX)
            };
            core_distances.push(core_dist);
        }

        core_distances
    }

    /// MR(a,b) = max(core_dist(a), core_dist(b), dist(a,b))
    fn compute_mutual_reachability(
        &self,
        points: &[ProjectedPoint],
        core_distances: &[f32],
    ) -> Vec<Vec<f32>> {
        let n = points.len();
        let mut mutual_reach = vec![vec![0.0f32; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dist = euclidean_2d(&points[i], &points[j]);
                let mr = dist.max(core_distances[i]).max(core_distances[j]);
                mutual_reach[i][j] = mr;
                mutual_reach[j][i] = mr;
            }
        }

        mutual_reach
    }

    /// Merge MST edges up to the gap threshold, then label components.
    ///
    /// Components meeting the size floor get labels in discovery order;
    /// all others are noise.
    fn extract_clusters(&self, mst: &[(usize, usize, f32)], n_points: usize) -> Vec<ClusterLabel> {
        let mut union_find = UnionFind::new(n_points);

        if let Some(gap_threshold) = self.detect_gap_threshold(mst) {
            for &(i, j, weight) in mst {
                // Edges are sorted; everything past the gap stays cut.
                if weight > gap_threshold {
                    break;
                }
                union_find.union(i, j);
            }
        }

        let mut component_sizes: HashMap<usize, usize> = HashMap::new();
        for i in 0..n_points {
            *component_sizes.entry(union_find.find(i)).or_insert(0) += 1;
        }

        // Degenerate clustering diagnostic: one component holding most points.
        if n_points > 10 {
            for (_, &size) in &component_sizes {
                if size > n_points / 2 {
                    warn!(
                        component_size = size,
                        total_points = n_points,
                        "Mega-cluster: single component contains {}% of all points",
                        (size * 100) / n_points
                    );
                }
            }
        }

        let mut labels = Vec::with_capacity(n_points);
        let mut cluster_map: HashMap<usize, u32> = HashMap::new();
        let mut next_cluster = 0u32;

        for i in 0..n_points {
            let root = union_find.find(i);
            let size = component_sizes.get(&root).copied().unwrap_or(1);
            if size >= self.params.min_cluster_size {
                let id = *cluster_map.entry(root).or_insert_with(|| {
                    let id = next_cluster;
                    next_cluster += 1;
                    id
                });
                labels.push(ClusterLabel::Cluster(id));
            } else {
                labels.push(ClusterLabel::Noise);
            }
        }

        labels
    }

    /// Find the edge-weight threshold separating dense regions.
    ///
    /// Data-driven: scanning MST edge weights in ascending order, the
    /// FIRST significant gap marks where dense structure ends and sparse
    /// bridging begins; edges below it merge, everything at or past it is
    /// cut. A gap is significant when it is large relative to the overall
    /// weight scale or when the weight jumps by a large multiple.
    ///
    /// Returns `None` when no significant gap exists: weights without
    /// density contrast mean there are no dense regions to separate, so
    /// nothing merges and every point becomes noise. This mirrors
    /// HDBSCAN's refusal to report the hierarchy root as a cluster.
    fn detect_gap_threshold(&self, mst: &[(usize, usize, f32)]) -> Option<f32> {
        if mst.is_empty() {
            return None;
        }

        // Edges are sorted by weight (from build_mst).
        let weights: Vec<f32> = mst.iter().map(|&(_, _, w)| w).collect();
        let n = weights.len();
        let scale = weights[n - 1].max(f32::EPSILON);

        for i in 1..n {
            let prev = weights[i - 1];
            let gap = weights[i] - prev;
            let absolute = gap >= 0.05 * scale;
            let multiplicative = prev > f32::EPSILON && weights[i] >= 3.0 * prev;
            if absolute || multiplicative {
                debug!(
                    mst_edges = n,
                    gap_at_edge = i,
                    gap = %format!("{gap:.4}"),
                    threshold = %format!("{prev:.4}"),
                    "Gap threshold selected"
                );
                return Some(prev);
            }
        }

        debug!(
            mst_edges = n,
            max_weight = %format!("{scale:.4}"),
            "No significant edge-weight gap; treating input as having no dense regions"
        );
        None
    }
}

/// Euclidean distance in the projected plane.
#[inline]
fn euclidean_2d(a: &ProjectedPoint, b: &ProjectedPoint) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Build a minimum spanning tree with Prim's algorithm.
///
/// Returns edges sorted by weight: (node_a, node_b, weight).
fn build_mst(distances: &[Vec<f32>]) -> Vec<(usize, usize, f32)> {
    let n = distances.len();
    if n == 0 {
        return vec![];
    }

    let mut in_tree = vec![false; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    let mut min_dist = vec![f32::MAX; n];
    let mut min_edge = vec![0usize; n];

    in_tree[0] = true;
    for j in 1..n {
        min_dist[j] = distances[0][j];
        min_edge[j] = 0;
    }

    for _ in 1..n {
        let mut min_val = f32::MAX;
        let mut min_idx = 0;
        for j in 0..n {
            if !in_tree[j] && min_dist[j] < min_val {
                min_val = min_dist[j];
                min_idx = j;
            }
        }

        in_tree[min_idx] = true;
        edges.push((min_edge[min_idx], min_idx, min_val));

        for j in 0..n {
            if !in_tree[j] && distances[min_idx][j] < min_dist[j] {
                min_dist[j] = distances[min_idx][j];
                min_edge[j] = min_idx;
            }
        }
    }

    edges.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
    edges
}

/// Union-find with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, i: usize, j: usize) {
        let pi = self.find(i);
        let pj = self.find(j);
        if pi == pj {
            return;
        }
        if self.rank[pi] < self.rank[pj] {
            self.parent[pi] = pj;
        } else if self.rank[pi] > self.rank[pj] {
            self.parent[pj] = pi;
        } else {
            self.parent[pj] = pi;
            self.rank[pi] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, x: f32, y: f32) -> ProjectedPoint {
        ProjectedPoint {
            case_id: id.to_string(),
            x,
            y,
        }
    }

    /// Tight grid of `count` points around (cx, cy).
    fn blob(prefix: &str, cx: f32, cy: f32, count: usize) -> Vec<ProjectedPoint> {
        (0..count)
            .map(|i| {
                point(
                    &format!("{prefix}{i}"),
                    cx + (i % 3) as f32 * 0.05,
                    cy + (i / 3) as f32 * 0.05,
                )
            })
            .collect()
    }

    #[test]
    fn two_separated_blobs_form_two_clusters() {
        let mut points = blob("a", 0.0, 0.0, 6);
        points.extend(blob("b", 100.0, 100.0, 6));

        let clusterer = DensityClusterer::new(DensityParams::with_min_cluster_size(5));
        let assignments = clusterer.fit(&points).expect("fit must succeed");

        let label_a = assignments[0].label;
        let label_b = assignments[6].label;
        assert!(!label_a.is_noise(), "blob a must be a cluster");
        assert!(!label_b.is_noise(), "blob b must be a cluster");
        assert_ne!(label_a, label_b, "blobs must be distinct clusters");

        assert!(
            assignments[..6].iter().all(|a| a.label == label_a),
            "all of blob a shares one label"
        );
        assert!(
            assignments[6..].iter().all(|a| a.label == label_b),
            "all of blob b shares one label"
        );
    }

    #[test]
    fn scattered_points_are_all_noise() {
        // Evenly spaced around a large circle: every point equally far
        // from its neighbors, so there is no dense region anywhere.
        let points: Vec<ProjectedPoint> = (0..12)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 12.0;
                point(
                    &format!("p{i}"),
                    1000.0 * angle.cos(),
                    1000.0 * angle.sin(),
                )
            })
            .collect();

        let assignments = DensityClusterer::with_defaults().fit(&points).unwrap();
        assert!(
            assignments.iter().all(|a| a.label.is_noise()),
            "with no dense regions everything is noise"
        );
    }

    #[test]
    fn region_below_size_floor_is_noise() {
        // 3 tight points among scatter, floor 5: the tight region is too
        // small to be a cluster.
        let mut points = blob("tight", 0.0, 0.0, 3);
        for i in 0..10 {
            points.push(point(&format!("far{i}"), 500.0 + 300.0 * i as f32, -400.0 * i as f32));
        }

        let clusterer = DensityClusterer::new(DensityParams::with_min_cluster_size(5));
        let assignments = clusterer.fit(&points).unwrap();
        assert!(
            assignments.iter().all(|a| a.label.is_noise()),
            "3 < min_cluster_size=5, so even the tight region is noise"
        );
    }

    #[test]
    fn region_meeting_size_floor_is_one_cluster() {
        // Same scatter, but 6 tight points with floor 5: exactly one cluster.
        let mut points = blob("tight", 0.0, 0.0, 6);
        for i in 0..10 {
            points.push(point(&format!("far{i}"), 500.0 + 300.0 * i as f32, -400.0 * i as f32));
        }

        let clusterer = DensityClusterer::new(DensityParams::with_min_cluster_size(5));
        let assignments = clusterer.fit(&points).unwrap();

        let clustered: Vec<&ClusterAssignment> =
            assignments.iter().filter(|a| !a.label.is_noise()).collect();
        assert_eq!(clustered.len(), 6, "exactly the tight points cluster");
        assert!(
            clustered.iter().all(|a| a.case_id.starts_with("tight")),
            "cluster members are the tight cases"
        );
        let label = clustered[0].label;
        assert!(clustered.iter().all(|a| a.label == label));
    }

    #[test]
    fn fewer_points_than_floor_is_all_noise_not_error() {
        let points = blob("few", 0.0, 0.0, 3);
        let assignments = DensityClusterer::with_defaults().fit(&points).unwrap();
        assert_eq!(assignments.len(), 3);
        assert!(assignments.iter().all(|a| a.label.is_noise()));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let assignments = DensityClusterer::with_defaults().fit(&[]).unwrap();
        assert!(assignments.is_empty());
    }

    #[test]
    fn invalid_params_rejected() {
        let params = DensityParams {
            min_cluster_size: 1,
            min_samples: 1,
        };
        assert!(params.validate().is_err());

        let params = DensityParams {
            min_cluster_size: 3,
            min_samples: 5,
        };
        assert!(params.validate().is_err());
    }
}
