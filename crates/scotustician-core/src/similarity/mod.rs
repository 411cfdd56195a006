//! Dense vector similarity primitives and deterministic neighbor ranking.

mod error;
mod primitives;
mod ranking;

pub use error::SimilarityError;
pub use primitives::{cosine_distance, cosine_similarity, dot_product, euclidean_distance, l2_norm};
pub use ranking::{rank_neighbors, RankedCase};
