//! Diagnostic presence stats, exported as CSV.
//!
//! Unlike the published index this file is refreshed on every run whatever
//! the structural outcome; it is telemetry, not a published view, and lives
//! outside the no-rewrite contract.

use std::fmt::Write as _;
use std::path::Path;

use warehouse_registry::SqliteEventLog;

use crate::error::Result;

pub const STATS_HEADER: &str =
    "artifact_type,artifact_id,scans_present,total_scans,presence_pct,last_seen_utc";

/// Write per-artifact scan presence to `out`. Degrades to a note file when
/// the scan/timestamp columns are unavailable in the source table.
pub fn write_stats(
    log: &SqliteEventLog,
    table: &str,
    columns: &[String],
    out: &Path,
) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let has_scan_id = columns.iter().any(|c| c == "scan_id");
    let has_timestamp = columns.iter().any(|c| c == "timestamp_utc");

    let mut text = String::new();
    if has_scan_id && has_timestamp {
        let (total_scans, stats) = log.presence_stats(table)?;
        text.push_str(STATS_HEADER);
        text.push('\n');
        for stat in stats {
            let pct = if total_scans > 0 {
                stat.scans_present as f64 / total_scans as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                text,
                "{},{},{},{},{:.4},{}",
                csv_field(&stat.artifact_type),
                csv_field(&stat.artifact_id),
                stat.scans_present,
                total_scans,
                pct,
                csv_field(stat.last_seen_utc.as_deref().unwrap_or("")),
            );
        }
    } else {
        text.push_str("note\nscan_id/timestamp_utc not available; stats limited.\n");
    }

    std::fs::write(out, text)?;
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
