//! Index materializer for the CodeParts warehouse.
//!
//! Collapses the append-only scan-event log into a canonical structural view,
//! fingerprints it, and republishes the index artifacts (JSON manifest plus
//! plain-text and markdown renderings) only when the fingerprint changes.
//! The registry stays the single source of truth; everything published here
//! is a disposable view.
//!
//! ## Pipeline
//!
//! 1. Read all rows from the registry (schema-tolerant).
//! 2. Collapse to the latest row per `(artifact_type, artifact_id)`.
//! 3. Derive canonical storage paths per item (pure, deterministic).
//! 4. Fingerprint the structural projection (paths and noise excluded).
//! 5. Compare against the previously published manifest: equal means no
//!    writes at all; different means all three outputs are republished as a
//!    set.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warehouse_indexer::{materialize, MaterializeConfig};
//!
//! # fn main() -> warehouse_indexer::Result<()> {
//! let mut config = MaterializeConfig::new("registry/registry.sqlite");
//! config.stats_out = Some("target/scan-stats.csv".into());
//!
//! let outcome = materialize(&config)?;
//! if outcome.is_updated() {
//!     println!("index republished");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod item;
pub mod manifest;
pub mod materialize;
pub mod paths;
pub mod projection;
pub mod render;
pub mod stats;

pub use error::{IndexError, Result};
pub use item::{current_view, FieldResolver, ProjectedItem};
pub use manifest::{Manifest, SCHEMA_VERSION};
pub use materialize::{materialize, MaterializeConfig, MaterializeOutcome};
pub use paths::{derive_paths, DerivedPaths};
pub use projection::{fingerprint, project, StructuralRow};
pub use render::{render_markdown, render_plain_text};
