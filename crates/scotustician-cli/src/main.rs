//! Scotustician CLI
//!
//! Batch entry point for the case-clustering pipeline: fetch section
//! embeddings from Postgres, aggregate per case, project with t-SNE,
//! cluster, and export a timestamped result bundle.
//!
//! One invocation is one run. Exit code 0 means a complete bundle was
//! written; exit code 1 means no bundle exists and stderr names the
//! stage that failed.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use scotustician_core::params::{
    AnalysisParams, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_PERPLEXITY, DEFAULT_RANDOM_SEED,
};
use scotustician_core::types::{NeighborScope, TermRange};
use scotustician_pipeline::{run_analysis, RunReport};
use scotustician_storage::{FsResultStore, PgEmbeddingStore};

/// Cluster Supreme Court oral-argument cases by transcript embeddings.
#[derive(Parser, Debug)]
#[command(name = "scotustician")]
#[command(version)]
#[command(about = "Aggregate, project, and cluster oral-argument case embeddings")]
struct Cli {
    /// First term to include (inclusive, e.g. 2020). Unbounded if omitted.
    #[arg(long, env = "START_TERM")]
    start_term: Option<String>,

    /// Last term to include (inclusive). Unbounded if omitted.
    #[arg(long, env = "END_TERM")]
    end_term: Option<String>,

    /// t-SNE perplexity. Clamped down automatically when the case count
    /// is small.
    #[arg(long, env = "TSNE_PERPLEXITY", default_value_t = DEFAULT_PERPLEXITY)]
    perplexity: usize,

    /// Minimum number of cases required to form a cluster.
    #[arg(long, env = "MIN_CLUSTER_SIZE", default_value_t = DEFAULT_MIN_CLUSTER_SIZE)]
    min_cluster_size: usize,

    /// RNG seed for the t-SNE projection.
    #[arg(long, env = "RANDOM_SEED", default_value_t = DEFAULT_RANDOM_SEED)]
    random_seed: u64,

    /// Rank representative neighbors within the cluster only, instead of
    /// over the whole case population.
    #[arg(long)]
    neighbors_within_cluster: bool,

    /// Postgres connection string for the embeddings database.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Directory result bundles are written under.
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn params(&self) -> AnalysisParams {
        let scope = if self.neighbors_within_cluster {
            NeighborScope::WithinCluster
        } else {
            NeighborScope::AllCases
        };
        AnalysisParams::default()
            .with_term_range(TermRange::new(self.start_term.clone(), self.end_term.clone()))
            .with_perplexity(self.perplexity)
            .with_min_cluster_size(self.min_cluster_size)
            .with_random_seed(self.random_seed)
            .with_neighbor_scope(scope)
    }
}

async fn execute(cli: &Cli) -> anyhow::Result<RunReport> {
    let store = PgEmbeddingStore::connect(&cli.database_url)
        .await
        .context("connecting to the embeddings database")?;
    let results = FsResultStore::new(&cli.output);

    let report = run_analysis(&store, &results, &cli.params()).await?;
    Ok(report)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr so stdout stays clean for the result line.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match execute(&cli).await {
        Ok(report) => {
            println!(
                "Clustering complete: {} cases, {} clusters, {} noise. Results at {}",
                report.case_count, report.cluster_count, report.noise_count, report.output_location
            );
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
