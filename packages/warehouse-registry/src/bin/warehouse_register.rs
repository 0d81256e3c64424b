//! Registry CLI
//!
//! Appends scan events to the warehouse registry. Registration tooling calls
//! `append` once per observed artifact per scan; the scan id used is printed
//! on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Create the registry database
//! warehouse-register --db registry/registry.sqlite init
//!
//! # Append one observation
//! warehouse-register append --artifact-type CID --artifact-id C1 \
//!     --pyn-id P1 --capability render
//!
//! # Print the schema SQL
//! warehouse-register schema
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use warehouse_registry::{
    ArtifactType, EventDraft, SqliteEventLog, StandaloneStatus, SCHEMA_SQL,
};

#[derive(Parser)]
#[command(name = "warehouse-register")]
#[command(about = "Append scan events to the CodeParts warehouse registry", long_about = None)]
struct Cli {
    /// Path to the registry sqlite database
    #[arg(long, default_value = "registry/registry.sqlite")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema
    Init,

    /// Print the schema SQL
    Schema,

    /// Append one scan event
    Append {
        /// Explicit scan id (allocated day-scoped when omitted)
        #[arg(long)]
        scan_id: Option<String>,

        /// Artifact type: PYN, SID or CID
        #[arg(long)]
        artifact_type: String,

        #[arg(long)]
        artifact_id: String,

        /// Lineage: extracted-from / source parent
        #[arg(long)]
        parent_id: Option<String>,

        /// This artifact supersedes another
        #[arg(long)]
        supersedes_id: Option<String>,

        /// This artifact is superseded by another
        #[arg(long)]
        superseded_by_id: Option<String>,

        /// Owning PYN (required for SID and CID rows)
        #[arg(long)]
        pyn_id: Option<String>,

        #[arg(long, default_value = "0")]
        sid_count: i64,

        #[arg(long, default_value = "0")]
        cid_count: i64,

        /// Capability tag (required for CID rows, forbidden otherwise)
        #[arg(long)]
        capability: Option<String>,

        /// Standalone status: none, inventory or runnable
        #[arg(long, default_value = "none")]
        standalone_status: String,

        /// Raw JSON object string; optional spillover
        #[arg(long)]
        metadata_json: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            SqliteEventLog::open(&cli.db)?;
            eprintln!("Initialized registry at {}", cli.db.display());
        }
        Commands::Schema => {
            println!("{}", SCHEMA_SQL.trim());
        }
        Commands::Append {
            scan_id,
            artifact_type,
            artifact_id,
            parent_id,
            supersedes_id,
            superseded_by_id,
            pyn_id,
            sid_count,
            cid_count,
            capability,
            standalone_status,
            metadata_json,
        } => {
            let mut draft = EventDraft::new(ArtifactType::parse(&artifact_type)?, artifact_id)
                .with_counts(sid_count, cid_count)
                .with_standalone_status(StandaloneStatus::parse(&standalone_status)?);
            draft.scan_id = scan_id;
            draft.parent_id = parent_id;
            draft.supersedes_id = supersedes_id;
            draft.superseded_by_id = superseded_by_id;
            draft.pyn_id = pyn_id;
            draft.capability = capability;
            draft.metadata_json = metadata_json;

            let log = SqliteEventLog::open(&cli.db)?;
            let used = log.append(&draft)?;
            println!("{}", used);
        }
    }

    Ok(())
}
