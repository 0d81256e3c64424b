//! Integration tests for the on-disk scan-event log.
//!
//! Covers durability across reopen, scan-id allocation against a real file,
//! and the uniqueness guardrail.

use tempfile::TempDir;
use warehouse_registry::{ArtifactType, EventDraft, SqliteEventLog, DEFAULT_TABLE};

fn pyn(id: &str) -> EventDraft {
    EventDraft::new(ArtifactType::Pyn, id)
}

#[test]
fn test_open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry/nested/registry.sqlite");

    let log = SqliteEventLog::open(&db_path).unwrap();
    log.append(&pyn("P1")).unwrap();

    assert!(db_path.exists());
}

#[test]
fn test_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry.sqlite");

    {
        let log = SqliteEventLog::open(&db_path).unwrap();
        log.append(&pyn("P1").with_scan_id("20260101-00001")).unwrap();
        log.append(
            &EventDraft::new(ArtifactType::Sid, "S1")
                .with_pyn_id("P1")
                .with_scan_id("20260101-00001"),
        )
        .unwrap();
    }

    let reopened = SqliteEventLog::open(&db_path).unwrap();
    let rows = reopened.read_all(DEFAULT_TABLE).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["artifact_id"], "P1");
    assert_eq!(rows[1]["artifact_id"], "S1");
    assert_eq!(rows[1]["pyn_id"], "P1");
}

#[test]
fn test_allocation_continues_after_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry.sqlite");
    let day = chrono::Utc::now().format("%Y%m%d").to_string();

    {
        let log = SqliteEventLog::open(&db_path).unwrap();
        assert_eq!(log.append(&pyn("P1")).unwrap(), format!("{}-00001", day));
    }

    let reopened = SqliteEventLog::open(&db_path).unwrap();
    assert_eq!(reopened.append(&pyn("P2")).unwrap(), format!("{}-00002", day));
}

#[test]
fn test_uniqueness_enforced_across_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry.sqlite");

    {
        let log = SqliteEventLog::open(&db_path).unwrap();
        log.append(&pyn("P1").with_scan_id("20260101-00001")).unwrap();
    }

    let reopened = SqliteEventLog::open(&db_path).unwrap();
    let err = reopened
        .append(&pyn("P1").with_scan_id("20260101-00001"))
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[test]
fn test_metadata_canonicalized_on_insert() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry.sqlite");

    let log = SqliteEventLog::open(&db_path).unwrap();
    log.append(&pyn("P1").with_metadata_json(r#"{ "z": 1, "a": "x" }"#))
        .unwrap();

    let rows = log.read_all(DEFAULT_TABLE).unwrap();
    assert_eq!(rows[0]["metadata_json"], r#"{"a":"x","z":1}"#);
}
