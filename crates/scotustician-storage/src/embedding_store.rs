//! Embedding store trait and the in-memory test implementation.

use async_trait::async_trait;

use scotustician_core::types::{SectionEmbedding, TermRange};

use crate::error::StorageError;

/// Read-only access to the section-embedding relation.
///
/// The pipeline issues exactly one range query per run. Implementations
/// must return rows ordered by `(case_id, section_index)` and exclude
/// rows with null vectors or non-positive token counts — the aggregator
/// re-validates, but the store owns the primary filter.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Fetch all section embeddings whose term falls in `range`.
    ///
    /// # Errors
    ///
    /// `StorageError::ConnectionFailed` / `QueryFailed` on connectivity
    /// problems — fatal to the run, never retried per case.
    async fn fetch_sections(&self, range: &TermRange) -> Result<Vec<SectionEmbedding>, StorageError>;
}

/// In-memory embedding store backed by a plain vector of rows.
///
/// Used by unit and integration tests to run the pipeline without a
/// database.
#[derive(Debug, Default, Clone)]
pub struct MemoryEmbeddingStore {
    sections: Vec<SectionEmbedding>,
}

impl MemoryEmbeddingStore {
    /// Create a store holding the given rows.
    pub fn new(sections: Vec<SectionEmbedding>) -> Self {
        Self { sections }
    }

    /// Number of rows held.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn fetch_sections(&self, range: &TermRange) -> Result<Vec<SectionEmbedding>, StorageError> {
        let mut rows: Vec<SectionEmbedding> = self
            .sections
            .iter()
            .filter(|s| range.contains(&s.term) && s.token_count > 0 && !s.vector.is_empty())
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.case_id
                .cmp(&b.case_id)
                .then(a.section_index.cmp(&b.section_index))
        });
        Ok(rows)
    }
}
