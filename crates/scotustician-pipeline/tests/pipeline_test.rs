//! End-to-end pipeline runs over the in-memory embedding store and a
//! tempdir-backed result store.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use scotustician_core::params::AnalysisParams;
use scotustician_core::types::{SectionEmbedding, TermRange};
use scotustician_pipeline::{run_analysis, PipelineError, RunMetadata};
use scotustician_storage::{FsResultStore, MemoryEmbeddingStore};

const DIM: usize = 12;

fn section(
    case_id: &str,
    section_index: u32,
    vector: Vec<f32>,
    token_count: u32,
    term: &str,
) -> SectionEmbedding {
    SectionEmbedding {
        case_id: case_id.to_string(),
        case_name: format!("{case_id} v. United States"),
        section_index,
        vector,
        token_count,
        term: term.to_string(),
    }
}

fn basis(dim_index: usize, magnitude: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[dim_index] = magnitude;
    v
}

/// Two tight groups of 7 cases each (orthogonal directions) plus 4
/// stragglers on their own axes.
fn blob_sections() -> Vec<SectionEmbedding> {
    let mut sections = Vec::new();
    for i in 0..7 {
        let mut a = basis(0, 1.0);
        a[1] = 0.01 * (i + 1) as f32;
        sections.push(section(&format!("2022_a{i}"), 0, a, 100, "2022"));

        let mut b = basis(2, 1.0);
        b[3] = 0.01 * (i + 1) as f32;
        sections.push(section(&format!("2022_b{i}"), 0, b, 100, "2022"));
    }
    for (i, dim) in [4usize, 5, 6, 7].into_iter().enumerate() {
        sections.push(section(&format!("2022_s{i}"), 0, basis(dim, 1.0), 100, "2022"));
    }
    sections
}

fn read_metadata(location: &str) -> RunMetadata {
    let json = std::fs::read_to_string(std::path::Path::new(location).join("metadata.json"))
        .expect("metadata.json must exist");
    serde_json::from_str(&json).expect("metadata must be valid JSON")
}

#[tokio::test]
async fn full_run_produces_consistent_bundle() {
    let store = MemoryEmbeddingStore::new(blob_sections());
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());
    let params = AnalysisParams::default();

    let report = run_analysis(&store, &results, &params)
        .await
        .expect("run must succeed");

    assert_eq!(report.case_count, 18);
    assert!(report.noise_count <= report.case_count);

    let dir = std::path::Path::new(&report.output_location);
    assert!(dir.join("results.csv").is_file());
    assert!(dir.join("metadata.json").is_file());

    let csv = std::fs::read_to_string(dir.join("results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 19, "header plus one row per case");
    assert!(csv.starts_with("case_id,case_name,term,x,y,cluster_label,"));

    let metadata = read_metadata(&report.output_location);
    assert_eq!(metadata.run_timestamp, report.run_timestamp);
    assert_eq!(metadata.parameters.perplexity, 30);
    assert_eq!(metadata.parameters.min_cluster_size, 5);
    assert_eq!(metadata.parameters.random_seed, 42);
    assert_eq!(metadata.summary.case_count, 18);
    assert_eq!(metadata.summary.cluster_count, metadata.representatives.len());
    assert_eq!(metadata.summary.noise_count, report.noise_count);

    for rep in &metadata.representatives {
        assert!(rep.neighbors.len() <= 5);
        assert!(
            rep.neighbors.iter().all(|n| n.case_id != rep.case_id),
            "a representative is not its own neighbor"
        );
        for pair in rep.neighbors.windows(2) {
            assert!(
                pair[0].similarity >= pair[1].similarity,
                "neighbors ordered by descending similarity"
            );
        }
    }
}

#[tokio::test]
async fn tight_groups_cluster_apart() {
    let store = MemoryEmbeddingStore::new(blob_sections());
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let report = run_analysis(&store, &results, &AnalysisParams::default())
        .await
        .unwrap();
    let metadata = read_metadata(&report.output_location);

    // Each 7-case group exceeds the floor of 5, so both must cluster,
    // and into different clusters.
    let csv = std::fs::read_to_string(
        std::path::Path::new(&report.output_location).join("results.csv"),
    )
    .unwrap();
    let mut a_labels = Vec::new();
    let mut b_labels = Vec::new();
    for line in csv.lines().skip(1) {
        let fields: Vec<&str> = line.split(',').collect();
        let (case_id, label) = (fields[0], fields[5].parse::<i64>().unwrap());
        if case_id.starts_with("2022_a") {
            a_labels.push(label);
        } else if case_id.starts_with("2022_b") {
            b_labels.push(label);
        }
    }

    assert!(a_labels.iter().all(|&l| l >= 0), "group a must not be noise");
    assert!(b_labels.iter().all(|&l| l >= 0), "group b must not be noise");
    assert!(
        a_labels.iter().all(|&l| l == a_labels[0]),
        "group a shares one label"
    );
    assert!(
        b_labels.iter().all(|&l| l == b_labels[0]),
        "group b shares one label"
    );
    assert_ne!(a_labels[0], b_labels[0], "groups are distinct clusters");
    assert_eq!(metadata.summary.cluster_count, 2);
}

#[tokio::test]
async fn weighted_aggregation_flows_into_export() {
    // One case, two sections with weights 10 and 30: below the cluster
    // floor, so the run degrades to a single noise point but must still
    // export a valid bundle.
    let sections = vec![
        section("2023_solo", 0, basis(0, 1.0), 10, "2023"),
        section("2023_solo", 1, basis(1, 1.0), 30, "2023"),
    ];
    let store = MemoryEmbeddingStore::new(sections);
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let report = run_analysis(&store, &results, &AnalysisParams::default())
        .await
        .unwrap();
    assert_eq!(report.case_count, 1);
    assert_eq!(report.cluster_count, 0);
    assert_eq!(report.noise_count, 1);

    let metadata = read_metadata(&report.output_location);
    assert!(metadata.representatives.is_empty());
    assert_eq!(metadata.summary.total_tokens, 40);
}

#[tokio::test]
async fn degenerate_input_completes_with_all_noise() {
    // 4 cases with a floor of 5: valid run, zero clusters, empty
    // representative list in the metadata document.
    let sections: Vec<SectionEmbedding> = (0..4)
        .map(|i| section(&format!("2021_c{i}"), 0, basis(i, 1.0), 50, "2021"))
        .collect();
    let store = MemoryEmbeddingStore::new(sections);
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let report = run_analysis(&store, &results, &AnalysisParams::default())
        .await
        .expect("degenerate input is a valid run, not an error");

    assert_eq!(report.case_count, 4);
    assert_eq!(report.cluster_count, 0);
    assert_eq!(report.noise_count, 4);

    let metadata = read_metadata(&report.output_location);
    assert!(metadata.representatives.is_empty());
}

#[tokio::test]
async fn term_filter_restricts_the_run() {
    let mut sections = blob_sections();
    sections.push(section("2010_old", 0, basis(8, 1.0), 50, "2010"));
    let store = MemoryEmbeddingStore::new(sections);
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let params = AnalysisParams::default()
        .with_term_range(TermRange::new(Some("2020".into()), Some("2023".into())));
    let report = run_analysis(&store, &results, &params).await.unwrap();

    assert_eq!(report.case_count, 18, "the 2010 case is out of range");
    let metadata = read_metadata(&report.output_location);
    assert_eq!(metadata.parameters.start_term.as_deref(), Some("2020"));
    assert_eq!(metadata.parameters.end_term.as_deref(), Some("2023"));
}

#[tokio::test]
async fn empty_term_range_is_a_fatal_no_cases_error() {
    let store = MemoryEmbeddingStore::new(blob_sections());
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let params = AnalysisParams::default()
        .with_term_range(TermRange::new(Some("1900".into()), Some("1901".into())));
    let result = run_analysis(&store, &results, &params).await;

    assert!(matches!(result, Err(PipelineError::NoCases)));
    // No partial output may exist after a fatal failure.
    assert!(
        std::fs::read_dir(tmp.path()).unwrap().next().is_none(),
        "destination must be empty after a failed run"
    );
}

#[tokio::test]
async fn repeated_runs_land_at_distinct_paths() {
    let store = MemoryEmbeddingStore::new(blob_sections());
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());
    let params = AnalysisParams::default();

    let first = run_analysis(&store, &results, &params).await.unwrap();
    let second = run_analysis(&store, &results, &params).await.unwrap();

    assert_ne!(
        first.output_location, second.output_location,
        "identical parameters must still produce distinct timestamped paths"
    );
    assert!(std::path::Path::new(&first.output_location).is_dir());
    assert!(std::path::Path::new(&second.output_location).is_dir());
}

#[tokio::test]
async fn dense_group_among_scattered_cases_is_recovered() {
    // A term's worth of cases: 6 near-duplicates hidden among 94
    // unrelated ones. The dense group must come back as one cluster
    // with no scattered cases absorbed into it, and its representative
    // must be drawn from the group itself.
    let mut rng = ChaCha8Rng::seed_from_u64(19);
    let dim = 16usize;
    let mut sections = Vec::new();
    for i in 0..6 {
        let mut v = vec![0.0f32; dim];
        v[0] = 1.0;
        for x in v.iter_mut() {
            *x += rng.gen_range(-0.02f32..0.02);
        }
        sections.push(section(&format!("2022_t{i}"), 0, v, 100, "2022"));
    }
    for i in 0..94 {
        let v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        sections.push(section(&format!("2022_r{i:02}"), 0, v, 100, "2022"));
    }

    let store = MemoryEmbeddingStore::new(sections);
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());

    let report = run_analysis(&store, &results, &AnalysisParams::default())
        .await
        .unwrap();
    assert_eq!(report.case_count, 100);

    let csv = std::fs::read_to_string(
        std::path::Path::new(&report.output_location).join("results.csv"),
    )
    .unwrap();
    let mut tight_labels = Vec::new();
    let mut outsider_labels = Vec::new();
    for line in csv.lines().skip(1) {
        let fields: Vec<&str> = line.split(',').collect();
        let (case_id, label) = (fields[0], fields[5].parse::<i64>().unwrap());
        if case_id.starts_with("2022_t") {
            tight_labels.push(label);
        } else {
            outsider_labels.push(label);
        }
    }

    assert_eq!(tight_labels.len(), 6);
    assert!(
        tight_labels.iter().all(|&l| l >= 0),
        "near-duplicate cases must not be noise"
    );
    let group_label = tight_labels[0];
    assert!(
        tight_labels.iter().all(|&l| l == group_label),
        "near-duplicate cases share one cluster"
    );
    assert!(
        outsider_labels.iter().all(|&l| l != group_label),
        "no scattered case joins the dense cluster"
    );

    let metadata = read_metadata(&report.output_location);
    let rep = metadata
        .representatives
        .iter()
        .find(|r| i64::from(r.cluster_label) == group_label)
        .expect("the dense cluster must have a representative");
    assert!(
        rep.case_id.starts_with("2022_t"),
        "the representative comes from inside the dense cluster"
    );
}

#[tokio::test]
async fn same_seed_reproduces_coordinates() {
    let store = MemoryEmbeddingStore::new(blob_sections());
    let tmp = TempDir::new().unwrap();
    let results = FsResultStore::new(tmp.path());
    let params = AnalysisParams::default().with_random_seed(7);

    let first = run_analysis(&store, &results, &params).await.unwrap();
    let second = run_analysis(&store, &results, &params).await.unwrap();

    let coords = |location: &str| -> Vec<(String, String, String)> {
        let csv = std::fs::read_to_string(std::path::Path::new(location).join("results.csv"))
            .unwrap();
        csv.lines()
            .skip(1)
            .map(|line| {
                let f: Vec<&str> = line.split(',').collect();
                (f[0].to_string(), f[3].to_string(), f[4].to_string())
            })
            .collect()
    };

    assert_eq!(
        coords(&first.output_location),
        coords(&second.output_location),
        "fixed seed must reproduce projected coordinates exactly"
    );
}
