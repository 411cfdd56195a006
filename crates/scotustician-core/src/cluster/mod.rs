//! Density-based clustering of projected case points.
//!
//! Clustering runs in the same 2D space the cases are plotted in, so
//! what is clustered is what the viewer shows. Points outside any dense
//! region get the explicit noise label.

mod error;
mod hdbscan;

pub use error::ClusterError;
pub use hdbscan::{DensityClusterer, DensityParams};
