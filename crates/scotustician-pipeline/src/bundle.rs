//! Result bundle contents: the tabular dataset and the metadata document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use scotustician_core::types::{CaseVector, ClusterLabel, ClusterRepresentative, ProjectedPoint};

/// One row of the tabular export: a case with its projected coordinates
/// and cluster label, plus the token statistics the viewer surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRow {
    pub case_id: String,
    pub case_name: String,
    pub term: String,
    pub x: f32,
    pub y: f32,
    pub cluster_label: i64,
    pub total_tokens: u64,
    pub section_count: u32,
}

impl CaseRow {
    /// Join one case's vector, projection, and cluster label into a row.
    pub fn from_parts(case: &CaseVector, point: &ProjectedPoint, label: ClusterLabel) -> Self {
        Self {
            case_id: case.case_id.clone(),
            case_name: case.case_name.clone(),
            term: case.term.clone(),
            x: point.x,
            y: point.y,
            cluster_label: label.as_i64(),
            total_tokens: case.total_tokens,
            section_count: case.section_count,
        }
    }
}

/// Parameters echoed into the metadata document so a bundle is
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub perplexity: usize,
    pub min_cluster_size: usize,
    pub random_seed: u64,
    pub start_term: Option<String>,
    pub end_term: Option<String>,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub case_count: usize,
    pub cluster_count: usize,
    pub noise_count: usize,
    pub total_tokens: u64,
    pub avg_tokens_per_case: f64,
    pub avg_sections_per_case: f64,
}

/// The structured metadata document written beside the tabular file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_timestamp: String,
    pub parameters: RunParameters,
    pub summary: RunSummary,
    /// Empty when every case is noise — a valid outcome.
    pub representatives: Vec<ClusterRepresentative>,
}

/// Render the tabular rows as CSV with a header line.
///
/// Case names can contain commas and quotes, so fields are escaped per
/// RFC 4180; numeric fields never need quoting.
pub fn render_csv(rows: &[CaseRow]) -> String {
    let mut out =
        String::from("case_id,case_name,term,x,y,cluster_label,total_tokens,section_count\n");
    for row in rows {
        out.push_str(&csv_field(&row.case_id));
        out.push(',');
        out.push_str(&csv_field(&row.case_name));
        out.push(',');
        out.push_str(&csv_field(&row.term));
        out.push(',');
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            row.x, row.y, row.cluster_label, row.total_tokens, row.section_count
        ));
    }
    out
}

/// Quote a CSV field only when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Compute run summary statistics from the joined rows.
///
/// `cluster_count` is the number of distinct non-noise labels in the
/// rows themselves, so the summary always agrees with the tabular file
/// even if a representative could not be selected for some cluster.
pub fn summarize(rows: &[CaseRow]) -> RunSummary {
    let case_count = rows.len();
    let noise_count = rows.iter().filter(|r| r.cluster_label < 0).count();
    let cluster_count = rows
        .iter()
        .filter(|r| r.cluster_label >= 0)
        .map(|r| r.cluster_label)
        .collect::<BTreeSet<i64>>()
        .len();
    let total_tokens: u64 = rows.iter().map(|r| r.total_tokens).sum();
    let total_sections: u64 = rows.iter().map(|r| r.section_count as u64).sum();

    let denom = case_count.max(1) as f64;
    RunSummary {
        case_count,
        cluster_count,
        noise_count,
        total_tokens,
        avg_tokens_per_case: total_tokens as f64 / denom,
        avg_sections_per_case: total_sections as f64 / denom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(case_id: &str, case_name: &str, label: i64) -> CaseRow {
        CaseRow {
            case_id: case_id.to_string(),
            case_name: case_name.to_string(),
            term: "2023".to_string(),
            x: 1.5,
            y: -2.5,
            cluster_label: label,
            total_tokens: 1000,
            section_count: 4,
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = vec![row("a", "A v. B", 0), row("b", "C v. D", -1)];
        let csv = render_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "case_id,case_name,term,x,y,cluster_label,total_tokens,section_count"
        );
        assert_eq!(lines[1], "a,A v. B,2023,1.5,-2.5,0,1000,4");
        assert_eq!(lines[2], "b,C v. D,2023,1.5,-2.5,-1,1000,4");
    }

    #[test]
    fn case_names_with_commas_are_quoted() {
        let rows = vec![row("x", "Smith, et al. v. Jones", 2)];
        let csv = render_csv(&rows);
        assert!(csv.contains("\"Smith, et al. v. Jones\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let rows = vec![row("x", "In re \"Baby M\"", 0)];
        let csv = render_csv(&rows);
        assert!(csv.contains("\"In re \"\"Baby M\"\"\""));
    }

    #[test]
    fn summary_counts_noise_and_tokens() {
        let rows = vec![row("a", "A", 0), row("b", "B", 0), row("c", "C", -1)];

        let summary = summarize(&rows);
        assert_eq!(summary.case_count, 3);
        assert_eq!(summary.cluster_count, 1);
        assert_eq!(summary.noise_count, 1);
        assert_eq!(summary.total_tokens, 3000);
        assert!((summary.avg_tokens_per_case - 1000.0).abs() < f64::EPSILON);
        assert!((summary.avg_sections_per_case - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cluster_count_is_the_distinct_labels_in_the_rows() {
        // The count must come from the tabular rows, not from whichever
        // clusters ended up with a representative.
        let rows = vec![
            row("a", "A", 0),
            row("b", "B", 1),
            row("c", "C", 1),
            row("d", "D", -1),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.cluster_count, 2);
        assert_eq!(summary.noise_count, 1);
    }

    #[test]
    fn empty_run_summary_does_not_divide_by_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.case_count, 0);
        assert_eq!(summary.avg_tokens_per_case, 0.0);
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let metadata = RunMetadata {
            run_timestamp: "20240101_000000_000000001".to_string(),
            parameters: RunParameters {
                perplexity: 30,
                min_cluster_size: 5,
                random_seed: 42,
                start_term: Some("2020".to_string()),
                end_term: None,
            },
            summary: summarize(&[]),
            representatives: vec![],
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let back: RunMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
