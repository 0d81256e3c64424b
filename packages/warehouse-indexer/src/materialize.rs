//! Fingerprint-gated index materialization.
//!
//! Reads the registry's current view, derives paths, fingerprints the
//! structural projection and compares against the previously published
//! manifest. On a match nothing is written; on a mismatch the manifest and
//! both human renderings are regenerated and published as a set, via
//! temporary files renamed into place, so a reader never observes a manifest
//! signature that disagrees with the renderings next to it.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use warehouse_registry::SqliteEventLog;

use crate::error::{IndexError, Result};
use crate::item::{current_view, warn_schema_drift};
use crate::manifest::{load_previous_signature, Manifest, SCHEMA_VERSION};
use crate::paths::derive_paths;
use crate::projection::fingerprint;
use crate::render::{render_markdown, render_plain_text};
use crate::stats::write_stats;

/// Where to read the log and where to publish the index.
#[derive(Debug, Clone)]
pub struct MaterializeConfig {
    pub db_path: PathBuf,
    pub table: String,
    pub json_out: PathBuf,
    pub txt_out: PathBuf,
    pub md_out: PathBuf,
    /// Diagnostic stats export; refreshed every run when set.
    pub stats_out: Option<PathBuf>,
}

impl MaterializeConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            table: warehouse_registry::DEFAULT_TABLE.to_string(),
            json_out: PathBuf::from("Artifacts/index-manifest.json"),
            txt_out: PathBuf::from("Artifacts/index.txt"),
            md_out: PathBuf::from("Artifacts/index.md"),
            stats_out: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Structural fingerprint unchanged; no index file was written.
    Unchanged { structural_signature: String },
    /// Fingerprint changed (or no previous manifest); all three index files
    /// were republished.
    Updated {
        structural_signature: String,
        item_count: usize,
    },
}

impl MaterializeOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, MaterializeOutcome::Updated { .. })
    }

    pub fn structural_signature(&self) -> &str {
        match self {
            MaterializeOutcome::Unchanged {
                structural_signature,
            }
            | MaterializeOutcome::Updated {
                structural_signature,
                ..
            } => structural_signature,
        }
    }
}

/// Run one materialization pass.
///
/// # Errors
///
/// `NotFound` when the registry database or the source table is absent;
/// both halt before any output is written. Stats export and publication
/// surface as `Io`/`Registry` errors.
pub fn materialize(config: &MaterializeConfig) -> Result<MaterializeOutcome> {
    if !config.db_path.exists() {
        return Err(IndexError::NotFound(format!(
            "DB not found: {}",
            config.db_path.display()
        )));
    }
    let log = SqliteEventLog::open_existing(&config.db_path)?;

    let columns = log.column_names(&config.table)?;
    if columns.is_empty() {
        return Err(IndexError::NotFound(format!(
            "Table not found or empty: {}",
            config.table
        )));
    }
    warn_schema_drift(&columns);

    let rows = log.read_all(&config.table)?;
    let mut items = current_view(&rows);
    for item in &mut items {
        let paths = derive_paths(item);
        item.source_path = paths.source_path;
        item.explainer_path = paths.explainer_path;
        item.artifacts_path = paths.artifacts_path;
    }

    let structural_signature = fingerprint(&items);

    // Telemetry first: the stats export refreshes whatever the outcome.
    if let Some(stats_out) = &config.stats_out {
        write_stats(&log, &config.table, &columns, stats_out)?;
    }

    let previous = load_previous_signature(&config.json_out);
    if previous.as_deref() == Some(structural_signature.as_str()) {
        info!(signature = %structural_signature, "no structural change; index files untouched");
        return Ok(MaterializeOutcome::Unchanged {
            structural_signature,
        });
    }

    let item_count = items.len();
    let generated_at_utc = utc_now_iso();
    let manifest = Manifest {
        generated_at_utc: generated_at_utc.clone(),
        schema_version: SCHEMA_VERSION,
        structural_signature: structural_signature.clone(),
        source_db: config.db_path.display().to_string(),
        table: config.table.clone(),
        item_count,
        items,
    };

    let mut json_text = serde_json::to_string_pretty(&manifest)?;
    json_text.push('\n');
    let txt_text = render_plain_text(&manifest.items);
    let md_text = render_markdown(&manifest.items, &generated_at_utc);

    publish(&[
        (config.json_out.as_path(), json_text.as_str()),
        (config.txt_out.as_path(), txt_text.as_str()),
        (config.md_out.as_path(), md_text.as_str()),
    ])?;

    info!(
        signature = %structural_signature,
        item_count,
        "structural change; index files republished"
    );
    Ok(MaterializeOutcome::Updated {
        structural_signature,
        item_count,
    })
}

/// Stage every output in a temp file beside its destination, then rename the
/// whole set into place. A failure while staging publishes nothing.
fn publish(outputs: &[(&Path, &str)]) -> Result<()> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        staged.push((tmp, *path));
    }
    for (tmp, path) in staged {
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
    }
    Ok(())
}

/// Second-precision ISO 8601, e.g. `2026-02-01T16:05:12Z`.
fn utc_now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
