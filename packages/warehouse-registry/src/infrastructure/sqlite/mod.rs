//! SQLite-backed scan-event log.
//!
//! The log is the single source of truth for artifact existence and lineage.
//! Appends are validated and written inside one transaction together with
//! scan-id allocation, so concurrent appends on the same UTC day cannot be
//! handed the same sequence number. Reads are schema-tolerant: rows come back
//! as name -> JSON-value maps so consumers survive added or dropped columns.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::debug;

use crate::domain::{EventDraft, ScanEvent};
use crate::error::{RegistryError, Result};

/// Default registry table name.
pub const DEFAULT_TABLE: &str = "scan_events";

/// Registry schema, applied idempotently on open.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS scan_events (
  timestamp_utc     TEXT    NOT NULL,
  scan_id           TEXT    NOT NULL,
  artifact_type     TEXT    NOT NULL,
  artifact_id       TEXT    NOT NULL,
  parent_id         TEXT,
  supersedes_id     TEXT,
  superseded_by_id  TEXT,
  pyn_id            TEXT,
  sid_count         INTEGER NOT NULL DEFAULT 0,
  cid_count         INTEGER NOT NULL DEFAULT 0,
  capability        TEXT,
  standalone_status TEXT    NOT NULL DEFAULT 'none',
  metadata_json     TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS ux_scan_events_scan_artifact
ON scan_events(scan_id, artifact_type, artifact_id);

CREATE INDEX IF NOT EXISTS ix_scan_events_artifact
ON scan_events(artifact_type, artifact_id);

CREATE INDEX IF NOT EXISTS ix_scan_events_time
ON scan_events(timestamp_utc);
";

/// One raw registry row as a column-name -> JSON-value map.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Per-artifact scan presence, for the diagnostic stats export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceStat {
    pub artifact_type: String,
    pub artifact_id: String,
    pub scans_present: i64,
    pub last_seen_utc: Option<String>,
}

/// Append-only scan-event log over SQLite.
#[derive(Clone)]
pub struct SqliteEventLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventLog {
    /// Open (or create) the registry at the given path and apply the schema.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let log = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        log.init_schema()?;
        Ok(log)
    }

    /// Open an existing registry without touching its schema. Readers use
    /// this so a missing table stays visible instead of being created empty.
    pub fn open_existing(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory registry (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let log = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Append one scan event and return the scan id used.
    ///
    /// Validates the draft first; a validation failure writes nothing. When
    /// the draft carries no explicit scan id, one is allocated day-scoped
    /// (`YYYYMMDD-NNNNN`) inside the same transaction as the insert.
    ///
    /// # Errors
    ///
    /// - `Lineage` / `Capability` / `Validation` per `EventDraft::validate`
    /// - `Database` on a duplicate `(scan_id, artifact_type, artifact_id)`
    pub fn append(&self, draft: &EventDraft) -> Result<String> {
        draft.validate()?;
        let metadata = draft.canonical_metadata()?;
        let now = Utc::now();

        let mut conn = self.conn.lock().unwrap();
        // Immediate: take the write lock before counting, so a concurrent
        // appender cannot observe the same row count for today's prefix.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let scan_id = match &draft.scan_id {
            Some(id) => id.clone(),
            None => next_scan_id(&tx, &now)?,
        };
        let event = ScanEvent::from_draft(draft, scan_id, now, metadata);

        tx.execute(
            "INSERT INTO scan_events (
               timestamp_utc, scan_id, artifact_type, artifact_id,
               parent_id, supersedes_id, superseded_by_id, pyn_id,
               sid_count, cid_count, capability, standalone_status, metadata_json
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                format_timestamp_ms(&event.timestamp_utc),
                event.scan_id,
                event.artifact_type.as_str(),
                event.artifact_id,
                event.parent_id,
                event.supersedes_id,
                event.superseded_by_id,
                event.pyn_id,
                event.sid_count,
                event.cid_count,
                event.capability,
                event.standalone_status.as_str(),
                event.metadata_json,
            ],
        )?;
        tx.commit()?;

        debug!(scan_id = %event.scan_id, artifact_id = %event.artifact_id, "appended scan event");
        Ok(event.scan_id)
    }

    /// All rows of `table` in insertion order, as schema-tolerant maps.
    pub fn read_all(&self, table: &str) -> Result<Vec<RawRow>> {
        check_table_name(table)?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", table))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let rows = stmt
            .query_map([], |row| {
                let mut map = RawRow::new();
                for (i, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
                }
                Ok(map)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Column names of `table`; empty when the table does not exist.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        check_table_name(table)?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Distinct-scan total plus per-artifact presence, for the stats export.
    pub fn presence_stats(&self, table: &str) -> Result<(i64, Vec<PresenceStat>)> {
        check_table_name(table)?;
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(DISTINCT scan_id) FROM {}", table),
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT artifact_type, artifact_id,
                    COUNT(DISTINCT scan_id) AS scans_present,
                    MAX(timestamp_utc) AS last_seen
             FROM {}
             GROUP BY artifact_type, artifact_id
             ORDER BY artifact_type, artifact_id",
            table
        ))?;
        let stats = stmt
            .query_map([], |row| {
                Ok(PresenceStat {
                    artifact_type: row.get(0)?,
                    artifact_id: row.get(1)?,
                    scans_present: row.get(2)?,
                    last_seen_utc: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, stats))
    }
}

/// Allocate the next day-scoped scan id: count of rows carrying today's
/// prefix, plus one, zero-padded to five digits. Must run inside the same
/// transaction as the insert that uses it.
fn next_scan_id(tx: &rusqlite::Transaction<'_>, now: &DateTime<Utc>) -> Result<String> {
    let day = now.format("%Y%m%d").to_string();
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM scan_events WHERE scan_id LIKE ?1",
        params![format!("{}-%", day)],
        |row| row.get(0),
    )?;
    Ok(format!("{}-{:05}", day, n + 1))
}

/// ISO 8601 with millisecond precision, e.g. `2026-02-01T16:05:12.123Z`.
fn format_timestamp_ms(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Table names reach SQL by interpolation; restrict them to identifiers.
fn check_table_name(table: &str) -> Result<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RegistryError::Validation(format!(
            "Invalid table name: {:?}",
            table
        )));
    }
    Ok(())
}

fn value_ref_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        // No blob columns in the registry schema.
        ValueRef::Blob(_) => serde_json::Value::Null,
    }
}
