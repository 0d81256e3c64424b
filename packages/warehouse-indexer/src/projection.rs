//! Structural projection and fingerprinting.
//!
//! The "publish only on structural change" contract hinges on comparing a
//! canonical fingerprint of a canonical projection — never a diff of raw
//! rows, which legitimately change every scan (timestamps, counters) without
//! being structurally meaningful.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::item::ProjectedItem;

/// The identity-relevant subset of an item. Counters, description, status
/// and the derived paths are deliberately excluded: paths are outputs of the
/// projection, not part of it.
///
/// Field order is alphabetical so serialization has stable key ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralRow {
    pub artifact_id: Option<String>,
    pub artifact_type: Option<String>,
    pub capability: Option<String>,
    pub cid_sequence: Option<String>,
    pub code_hash_full: Option<String>,
    pub use_env_last: Option<String>,
}

/// Project items to structural rows, sorted canonically.
pub fn project(items: &[ProjectedItem]) -> Vec<StructuralRow> {
    let mut rows: Vec<StructuralRow> = items
        .iter()
        .map(|item| StructuralRow {
            artifact_id: item.artifact_id.clone(),
            artifact_type: item.artifact_type.clone(),
            capability: item.capability.clone(),
            cid_sequence: item.cid_sequence.clone(),
            code_hash_full: item.code_hash_full.clone(),
            use_env_last: item.use_env_last.clone(),
        })
        .collect();
    rows.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    rows
}

fn sort_key<'a>(row: &'a StructuralRow) -> (&'a str, &'a str, &'a str, &'a str) {
    (
        row.artifact_type.as_deref().unwrap_or(""),
        row.artifact_id.as_deref().unwrap_or(""),
        row.capability.as_deref().unwrap_or(""),
        row.use_env_last.as_deref().unwrap_or(""),
    )
}

/// SHA-256 over the compact serialization of the sorted projection.
///
/// Order-independent: any two item collections that are set-equal after
/// projection fingerprint byte-identically.
pub fn fingerprint(items: &[ProjectedItem]) -> String {
    let rows = project(items);
    // serde_json emits compact separators and the struct's (alphabetical)
    // field order, so the payload is canonical without extra passes.
    let payload = serde_json::to_string(&rows).expect("structural rows serialize");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}
