//! Indexer CLI
//!
//! Reads the registry, compares against the current manifest, and only
//! rewrites the repo index files on structural change.
//!
//! # Usage
//!
//! ```bash
//! warehouse-index --db registry/registry.sqlite
//!
//! # Custom outputs plus the noisy stats export (outside the repo)
//! warehouse-index --db registry/registry.sqlite \
//!     --json-out Artifacts/index-manifest.json \
//!     --txt-out Artifacts/index.txt \
//!     --md-out Artifacts/index.md \
//!     --stats-out ../scan-stats.csv
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use warehouse_indexer::{materialize, MaterializeConfig, MaterializeOutcome};

#[derive(Parser)]
#[command(name = "warehouse-index")]
#[command(
    about = "Materialize the warehouse index, rewriting files only on structural change",
    long_about = None
)]
struct Cli {
    /// Path to the registry sqlite file (outside the repo is fine)
    #[arg(long)]
    db: PathBuf,

    /// Registry table name
    #[arg(long, default_value = "scan_events")]
    table: String,

    /// Machine index JSON
    #[arg(long, default_value = "Artifacts/index-manifest.json")]
    json_out: PathBuf,

    /// Human index TXT
    #[arg(long, default_value = "Artifacts/index.txt")]
    txt_out: PathBuf,

    /// Human index MD
    #[arg(long, default_value = "Artifacts/index.md")]
    md_out: PathBuf,

    /// Noisy stats CSV, refreshed every run (keep outside the repo)
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MaterializeConfig {
        db_path: cli.db,
        table: cli.table,
        json_out: cli.json_out,
        txt_out: cli.txt_out,
        md_out: cli.md_out,
        stats_out: cli.stats_out,
    };

    match materialize(&config)? {
        MaterializeOutcome::Unchanged { .. } => {
            println!("No structural change detected. Repo index files not rewritten.");
        }
        MaterializeOutcome::Updated { .. } => {
            println!("Structural change detected. Repo index files updated.");
        }
    }

    Ok(())
}
