//! End-to-end materialization tests against a real registry database.
//!
//! Covers the publish-only-on-structural-change contract: first run
//! publishes, idempotent re-runs write nothing, noise-only appends stay
//! `Unchanged`, structural appends republish, and the stats side channel
//! refreshes regardless of outcome.

use std::path::Path;

use tempfile::TempDir;
use warehouse_indexer::{materialize, Manifest, MaterializeConfig, MaterializeOutcome};
use warehouse_registry::{ArtifactType, EventDraft, SqliteEventLog, StandaloneStatus};

struct Fixture {
    _dir: TempDir,
    log: SqliteEventLog,
    config: MaterializeConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("registry.sqlite");
    let log = SqliteEventLog::open(&db_path).unwrap();

    let mut config = MaterializeConfig::new(&db_path);
    config.json_out = dir.path().join("Artifacts/index-manifest.json");
    config.txt_out = dir.path().join("Artifacts/index.txt");
    config.md_out = dir.path().join("Artifacts/index.md");
    config.stats_out = Some(dir.path().join("stats/scan-stats.csv"));

    Fixture {
        _dir: dir,
        log,
        config,
    }
}

fn seed(log: &SqliteEventLog, scan_id: &str) {
    log.append(
        &EventDraft::new(ArtifactType::Pyn, "P1")
            .with_scan_id(scan_id)
            .with_counts(1, 2)
            .with_metadata_json(r#"{"use_env_last":"prod","code_hash_full":"ba7816bf8f01"}"#),
    )
    .unwrap();
    log.append(
        &EventDraft::new(ArtifactType::Sid, "S1")
            .with_scan_id(scan_id)
            .with_pyn_id("P1")
            .with_counts(0, 3)
            .with_metadata_json(r#"{"use_env_last":"prod","cid_sequence":"abc"}"#),
    )
    .unwrap();
    log.append(
        &EventDraft::new(ArtifactType::Cid, "C1")
            .with_scan_id(scan_id)
            .with_pyn_id("P1")
            .with_capability("render")
            .with_metadata_json(r#"{"use_env_last":"dev"}"#),
    )
    .unwrap();
}

fn read_manifest(path: &Path) -> Manifest {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_first_materialization_publishes_everything() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");

    let outcome = materialize(&fx.config).unwrap();
    assert!(outcome.is_updated());

    let manifest = read_manifest(&fx.config.json_out);
    assert_eq!(manifest.schema_version, 1);
    assert_eq!(manifest.item_count, 3);
    assert_eq!(manifest.items.len(), 3);
    assert_eq!(manifest.structural_signature, outcome.structural_signature());
    assert_eq!(manifest.table, "scan_events");

    // Items sorted by (type, id), paths embedded.
    assert_eq!(manifest.items[0].artifact_type.as_deref(), Some("CID"));
    assert_eq!(
        manifest.items[0].artifacts_path,
        "Artifacts/CID/C1/CAP_render/"
    );
    assert_eq!(manifest.items[1].artifact_type.as_deref(), Some("PYN"));
    assert_eq!(
        manifest.items[1].artifacts_path,
        "Artifacts/PY/prod/SID-count_001/P1/"
    );
    // sha256("abc") starts with ba7816bf
    assert_eq!(
        manifest.items[2].artifacts_path,
        "Artifacts/SID/prod/CID-count_003/SEQ_ba7816bf/S1/"
    );

    let txt = std::fs::read_to_string(&fx.config.txt_out).unwrap();
    assert!(txt.contains("ENV: dev"));
    assert!(txt.contains("ENV: prod"));
    assert!(txt.contains("CID | id=C1 | cap=render"));

    let md = std::fs::read_to_string(&fx.config.md_out).unwrap();
    assert!(md.starts_with("# Artifacts Index"));
    assert!(md.contains("## ENV: prod"));

    assert!(fx.config.stats_out.as_ref().unwrap().exists());
}

#[test]
fn test_rerun_without_appends_is_unchanged_and_writes_nothing() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");

    materialize(&fx.config).unwrap();

    // Remove the renderings: an Unchanged run must not bring them back.
    std::fs::remove_file(&fx.config.txt_out).unwrap();
    std::fs::remove_file(&fx.config.md_out).unwrap();

    let outcome = materialize(&fx.config).unwrap();
    assert!(matches!(outcome, MaterializeOutcome::Unchanged { .. }));
    assert!(!fx.config.txt_out.exists());
    assert!(!fx.config.md_out.exists());
}

#[test]
fn test_reobservation_with_identical_structure_is_unchanged() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");
    materialize(&fx.config).unwrap();

    // New scan, same structural content, different noise fields.
    fx.log
        .append(
            &EventDraft::new(ArtifactType::Cid, "C1")
                .with_scan_id("20260102-00001")
                .with_pyn_id("P1")
                .with_capability("render")
                .with_standalone_status(StandaloneStatus::Runnable)
                .with_metadata_json(r#"{"use_env_last":"dev"}"#),
        )
        .unwrap();

    let outcome = materialize(&fx.config).unwrap();
    assert!(!outcome.is_updated());
}

#[test]
fn test_structural_change_republishes_with_distinct_pair_count() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");
    materialize(&fx.config).unwrap();

    // Same artifact, new capability: structural.
    fx.log
        .append(
            &EventDraft::new(ArtifactType::Cid, "C1")
                .with_scan_id("20260102-00001")
                .with_pyn_id("P1")
                .with_capability("parse")
                .with_metadata_json(r#"{"use_env_last":"dev"}"#),
        )
        .unwrap();

    let outcome = materialize(&fx.config).unwrap();
    assert!(outcome.is_updated());

    // Four rows in the log, still three distinct (type, id) pairs.
    let manifest = read_manifest(&fx.config.json_out);
    assert_eq!(manifest.item_count, 3);
    assert_eq!(
        manifest.items[0].capability.as_deref(),
        Some("parse"),
        "latest row wins"
    );
}

#[test]
fn test_corrupt_manifest_forces_republish() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");
    materialize(&fx.config).unwrap();

    std::fs::write(&fx.config.json_out, "{not json").unwrap();

    let outcome = materialize(&fx.config).unwrap();
    assert!(outcome.is_updated());
    // Manifest is whole again.
    read_manifest(&fx.config.json_out);
}

#[test]
fn test_stats_refresh_even_when_unchanged() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");
    materialize(&fx.config).unwrap();

    let stats_out = fx.config.stats_out.clone().unwrap();
    std::fs::remove_file(&stats_out).unwrap();

    let outcome = materialize(&fx.config).unwrap();
    assert!(!outcome.is_updated());
    assert!(stats_out.exists(), "stats side channel is always refreshed");

    let text = std::fs::read_to_string(&stats_out).unwrap();
    assert!(text.starts_with(
        "artifact_type,artifact_id,scans_present,total_scans,presence_pct,last_seen_utc"
    ));
    assert!(text.contains("CID,C1,1,1,100.0000,"));
}

#[test]
fn test_missing_table_halts_before_output() {
    let fx = fixture();
    seed(&fx.log, "20260101-00001");

    let mut config = fx.config.clone();
    config.table = "no_such_table".to_string();

    assert!(materialize(&config).is_err());
    assert!(!config.json_out.exists());
}
