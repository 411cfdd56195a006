//! Scotustician Storage
//!
//! Storage access for the case-clustering pipeline:
//!
//! - [`EmbeddingStore`]: read-only access to the section-embedding
//!   relation, with a Postgres/pgvector implementation
//!   ([`PgEmbeddingStore`]) and an in-memory implementation for tests
//!   ([`MemoryEmbeddingStore`])
//! - [`ResultStore`]: durable, all-or-nothing hand-off of the analysis
//!   bundle, with a filesystem implementation ([`FsResultStore`])
//!
//! Both are traits so the pipeline depends on the contract, not the
//! backend, and tests run without a database or object store.

mod embedding_store;
mod error;
mod postgres;
mod result_store;

pub use embedding_store::{EmbeddingStore, MemoryEmbeddingStore};
pub use error::StorageError;
pub use postgres::PgEmbeddingStore;
pub use result_store::{Artifact, FsResultStore, ResultStore};
