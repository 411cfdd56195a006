//! Typed records flowing between pipeline stages.
//!
//! Database rows and JSON blobs are validated into these types at the
//! aggregation boundary; downstream stages never see loosely-typed data.

mod case;
mod representative;
mod section;

pub use case::{CaseVector, ClusterAssignment, ClusterLabel, ProjectedPoint};
pub use representative::{ClusterRepresentative, Neighbor, NeighborScope};
pub use section::{SectionEmbedding, TermRange};
