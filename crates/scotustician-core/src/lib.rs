//! Scotustician Core Library
//!
//! Domain types and algorithms for case-level clustering of Supreme Court
//! oral-argument transcript embeddings.
//!
//! # Pipeline stages
//!
//! This crate provides the four algorithmic stages of the clustering
//! pipeline, in dependency order:
//!
//! 1. [`aggregate`] — collapse per-section embeddings into one
//!    token-weighted vector per case
//! 2. [`reduce`] — t-SNE projection of case vectors into 2D
//! 3. [`cluster`] — density-based (HDBSCAN-style) clustering of the
//!    projected points, with explicit noise labeling
//! 4. [`representatives`] — centroid-closest exemplar and nearest
//!    neighbors per cluster
//!
//! Orchestration, storage access, and export live in the
//! `scotustician-storage` and `scotustician-pipeline` crates.
//!
//! # Example
//!
//! ```
//! use scotustician_core::params::AnalysisParams;
//!
//! let params = AnalysisParams::default().with_min_cluster_size(5);
//! assert!(params.validate().is_ok());
//! ```

pub mod aggregate;
pub mod cluster;
pub mod params;
pub mod reduce;
pub mod representatives;
pub mod similarity;
pub mod types;

// Re-exports for convenience
pub use params::AnalysisParams;
pub use types::{
    CaseVector, ClusterAssignment, ClusterLabel, ClusterRepresentative, Neighbor, ProjectedPoint,
    SectionEmbedding, TermRange,
};
