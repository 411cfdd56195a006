//! Embedding aggregation: per-section vectors to one weighted vector per case.
//!
//! The case vector is the token-count-weighted mean of the case's section
//! vectors, accumulated in f64 with no normalization:
//!
//! `sum(section_vector_i * token_count_i) / sum(token_count_i)`
//!
//! Sections are processed in ascending section-index order. Order does not
//! change the weighted mean, but is fixed so any downstream tie-breaking
//! is deterministic.
//!
//! # Failure policy
//!
//! Per-case data-integrity problems (inconsistent vector dimensions,
//! non-positive token counts) skip that case with a logged diagnostic and
//! never abort the run. Store connectivity failures are the caller's
//! responsibility and surface before this module is reached.

mod error;

pub use error::AggregateError;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::types::{CaseVector, SectionEmbedding, TermRange};

/// Aggregate section embeddings into one [`CaseVector`] per case.
///
/// `sections` is expected to be pre-filtered by the store query; the
/// `range` is re-checked here so the invariant does not depend on the
/// store implementation. Output is sorted by `case_id` ascending.
///
/// Per-case aggregation is embarrassingly parallel (each case depends
/// only on its own sections) and runs on the rayon pool.
pub fn aggregate_cases(sections: Vec<SectionEmbedding>, range: &TermRange) -> Vec<CaseVector> {
    let total_sections = sections.len();

    // Group by case id, preserving only in-range rows.
    let mut grouped: Vec<(String, Vec<SectionEmbedding>)> = Vec::new();
    let mut sorted = sections;
    sorted.sort_by(|a, b| {
        a.case_id
            .cmp(&b.case_id)
            .then(a.section_index.cmp(&b.section_index))
    });

    for section in sorted {
        if !range.contains(&section.term) {
            debug!(
                case_id = %section.case_id,
                term = %section.term,
                "Dropping out-of-range section that leaked through the store query"
            );
            continue;
        }
        match grouped.last_mut() {
            Some((id, group)) if *id == section.case_id => group.push(section),
            _ => grouped.push((section.case_id.clone(), vec![section])),
        }
    }

    let case_count = grouped.len();
    info!(
        sections = total_sections,
        cases = case_count,
        "Aggregating section embeddings into case vectors"
    );

    let mut cases: Vec<CaseVector> = grouped
        .into_par_iter()
        .filter_map(|(case_id, group)| match weighted_case_vector(&group) {
            Ok(case) => Some(case),
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "Skipping case with invalid sections");
                None
            }
        })
        .collect();

    // Parallel collection order is nondeterministic; restore id order.
    cases.sort_by(|a, b| a.case_id.cmp(&b.case_id));

    if cases.len() < case_count {
        warn!(
            skipped = case_count - cases.len(),
            "Some cases were skipped due to data-integrity errors"
        );
    }

    cases
}

/// Compute the weighted vector for one case's sections.
///
/// Sections must already be sorted by section index.
fn weighted_case_vector(sections: &[SectionEmbedding]) -> Result<CaseVector, AggregateError> {
    let first = sections.first().ok_or(AggregateError::EmptyCase)?;
    let dim = first.vector.len();
    if dim == 0 {
        return Err(AggregateError::EmptyVector {
            section_index: first.section_index,
        });
    }

    let mut weighted_sum = vec![0.0f64; dim];
    let mut total_tokens: u64 = 0;

    for section in sections {
        if section.vector.len() != dim {
            return Err(AggregateError::DimensionMismatch {
                expected: dim,
                actual: section.vector.len(),
                section_index: section.section_index,
            });
        }
        if section.token_count == 0 {
            return Err(AggregateError::InvalidTokenCount {
                section_index: section.section_index,
            });
        }

        let weight = section.token_count as f64;
        for (acc, &value) in weighted_sum.iter_mut().zip(section.vector.iter()) {
            *acc += value as f64 * weight;
        }
        total_tokens += section.token_count as u64;
    }

    let inv_total = 1.0 / total_tokens as f64;
    let vector: Vec<f32> = weighted_sum.iter().map(|&v| (v * inv_total) as f32).collect();

    Ok(CaseVector {
        case_id: first.case_id.clone(),
        case_name: first.case_name.clone(),
        term: first.term.clone(),
        vector,
        total_tokens,
        section_count: sections.len() as u32,
    })
}
