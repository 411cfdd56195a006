//! Run parameters for the clustering pipeline.
//!
//! The pipeline is parameterized entirely by this object — there is no
//! ambient configuration or cached client state. One `AnalysisParams`
//! value describes one run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{NeighborScope, TermRange};

/// Default t-SNE perplexity.
pub const DEFAULT_PERPLEXITY: usize = 30;
/// Default minimum cluster size (hard floor; smaller regions are noise).
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;
/// Default RNG seed, fixed for reproducibility.
pub const DEFAULT_RANDOM_SEED: u64 = 42;
/// Number of nearest neighbors reported per cluster representative.
pub const NEIGHBOR_COUNT: usize = 5;

/// Invalid parameter combinations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Parameters for one clustering run.
///
/// # Example
///
/// ```
/// use scotustician_core::params::AnalysisParams;
/// use scotustician_core::types::TermRange;
///
/// let params = AnalysisParams::default()
///     .with_term_range(TermRange::new(Some("2020".into()), Some("2023".into())))
///     .with_perplexity(25);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Inclusive term filter; unbounded by default.
    pub term_range: TermRange,
    /// t-SNE perplexity (clamped downward at fit time if the case count
    /// is too small; see [`crate::reduce`]).
    pub perplexity: usize,
    /// Minimum number of cases required to form a cluster.
    pub min_cluster_size: usize,
    /// Seed for the t-SNE RNG.
    pub random_seed: u64,
    /// Population nearest neighbors are ranked over.
    pub neighbor_scope: NeighborScope,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            term_range: TermRange::unbounded(),
            perplexity: DEFAULT_PERPLEXITY,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            random_seed: DEFAULT_RANDOM_SEED,
            neighbor_scope: NeighborScope::default(),
        }
    }
}

impl AnalysisParams {
    /// Set the term filter.
    #[must_use]
    pub fn with_term_range(mut self, range: TermRange) -> Self {
        self.term_range = range;
        self
    }

    /// Set the t-SNE perplexity.
    ///
    /// Value is NOT clamped here; `validate()` checks the lower bound and
    /// the reducer clamps against the case count at fit time.
    #[must_use]
    pub fn with_perplexity(mut self, perplexity: usize) -> Self {
        self.perplexity = perplexity;
        self
    }

    /// Set the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Set the neighbor-ranking scope.
    #[must_use]
    pub fn with_neighbor_scope(mut self, scope: NeighborScope) -> Self {
        self.neighbor_scope = scope;
        self
    }

    /// Validate parameter bounds, failing fast with a descriptive message.
    ///
    /// # Errors
    ///
    /// Returns `ParamsError::InvalidParameter` if:
    /// - `perplexity` < 2
    /// - `min_cluster_size` < 2
    /// - the term range bounds are inverted (start > end)
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.perplexity < 2 {
            return Err(ParamsError::InvalidParameter(format!(
                "perplexity must be >= 2, got {}",
                self.perplexity
            )));
        }
        if self.min_cluster_size < 2 {
            return Err(ParamsError::InvalidParameter(format!(
                "min_cluster_size must be >= 2, got {}. A cluster needs at least 2 members.",
                self.min_cluster_size
            )));
        }
        if let (Some(start), Some(end)) = (&self.term_range.start, &self.term_range.end) {
            if start > end {
                return Err(ParamsError::InvalidParameter(format!(
                    "term range start '{start}' is after end '{end}'"
                )));
            }
        }
        Ok(())
    }
}
