//! Scan-event registry for the CodeParts warehouse.
//!
//! Durable, append-only log of artifact observations. External tooling
//! appends one event per observed artifact per scan; the indexer reads the
//! log back to materialize the published index.
//!
//! ## Core properties
//!
//! 1. **Append-only**: rows are immutable once written; the log is a time
//!    series, not a snapshot.
//! 2. **Day-scoped scan ids**: `YYYYMMDD-NNNNN`, allocated atomically with
//!    the insert.
//! 3. **Guardrails at the boundary**: lineage, capability and metadata
//!    validation happen before any write.
//!
//! ## Usage
//!
//! ```rust
//! use warehouse_registry::{ArtifactType, EventDraft, SqliteEventLog};
//!
//! # fn main() -> warehouse_registry::Result<()> {
//! let log = SqliteEventLog::in_memory()?;
//!
//! let scan_id = log.append(
//!     &EventDraft::new(ArtifactType::Cid, "C1")
//!         .with_pyn_id("P1")
//!         .with_capability("render"),
//! )?;
//! assert_eq!(scan_id.len(), "YYYYMMDD-NNNNN".len());
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{ArtifactType, EventDraft, ScanEvent, StandaloneStatus};
pub use error::{RegistryError, Result};
pub use infrastructure::{PresenceStat, RawRow, SqliteEventLog, DEFAULT_TABLE, SCHEMA_SQL};
