//! Dimensionality reduction: case vectors to 2D coordinates via t-SNE.
//!
//! A single run projects the whole case set as one batch — neighbor
//! embedding depends on global structure, so this stage is neither
//! incremental nor parallelizable across cases.

mod error;
mod tsne;

pub use error::ReduceError;
pub use tsne::{TsneParams, TsneReducer};
