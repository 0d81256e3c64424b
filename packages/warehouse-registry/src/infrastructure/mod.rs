//! Storage adapters for the scan-event registry.

pub mod sqlite;

pub use sqlite::{PresenceStat, RawRow, SqliteEventLog, DEFAULT_TABLE, SCHEMA_SQL};
