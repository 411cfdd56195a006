//! Section-level input records and term-range filtering.

use serde::{Deserialize, Serialize};

/// One embedded transcript section, as read from the embedding store.
///
/// A section is a contiguous portion of an oral argument (petitioner
/// opening, respondent argument, rebuttal, ...) — the atomic unit the
/// upstream embedding service generates vectors for.
///
/// # Invariants (enforced at aggregation)
///
/// - `section_index` values are contiguous per case starting at 0
/// - `token_count` is strictly positive
/// - all sections of a case share one vector dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionEmbedding {
    /// Case identifier, e.g. `"2023_22-451"`.
    pub case_id: String,
    /// Human-readable case name, e.g. `"Loper Bright Enterprises v. Raimondo"`.
    pub case_name: String,
    /// Position of this section within its case, 0-based.
    pub section_index: u32,
    /// Dense embedding vector for the section text.
    pub vector: Vec<f32>,
    /// Token count of the section text; aggregation weight.
    pub token_count: u32,
    /// Court term (yearly session), e.g. `"2023"`.
    pub term: String,
}

/// Inclusive term range for filtering cases chronologically.
///
/// Either bound may be absent, meaning unbounded on that side. Terms are
/// four-digit year strings, so lexicographic comparison matches numeric
/// ordering.
///
/// # Example
///
/// ```
/// use scotustician_core::types::TermRange;
///
/// let range = TermRange::new(Some("2020".into()), Some("2022".into()));
/// assert!(range.contains("2021"));
/// assert!(!range.contains("2023"));
///
/// let open = TermRange::unbounded();
/// assert!(open.contains("1980"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRange {
    /// Inclusive lower bound; `None` means earliest available.
    pub start: Option<String>,
    /// Inclusive upper bound; `None` means latest available.
    pub end: Option<String>,
}

impl TermRange {
    /// Create a range with the given optional bounds.
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }

    /// Range matching every term.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether both bounds are absent.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `term` falls within the range (inclusive on both ends).
    pub fn contains(&self, term: &str) -> bool {
        if let Some(start) = &self.start {
            if term < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if term > end.as_str() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_range_contains_everything() {
        let range = TermRange::unbounded();
        assert!(range.is_unbounded());
        assert!(range.contains("1791"));
        assert!(range.contains("2024"));
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let range = TermRange::new(Some("2020".into()), Some("2022".into()));
        assert!(!range.contains("2019"));
        assert!(range.contains("2020"), "start bound is inclusive");
        assert!(range.contains("2021"));
        assert!(range.contains("2022"), "end bound is inclusive");
        assert!(!range.contains("2023"));
    }

    #[test]
    fn half_open_ranges() {
        let from = TermRange::new(Some("2000".into()), None);
        assert!(!from.contains("1999"));
        assert!(from.contains("2024"));

        let until = TermRange::new(None, Some("1990".into()));
        assert!(until.contains("1980"));
        assert!(!until.contains("1991"));
    }
}
