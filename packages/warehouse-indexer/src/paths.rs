//! Canonical storage paths per artifact.
//!
//! Pure view over the projected item: the registry stays the truth, and
//! re-running materialization never changes paths for unchanged inputs.

use sha2::{Digest, Sha256};

use crate::item::ProjectedItem;

/// The three canonical paths derived for every artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPaths {
    pub source_path: String,
    pub explainer_path: String,
    pub artifacts_path: String,
}

/// Derive the canonical paths for one item. Total: missing fields fall back
/// to `UNKNOWN`/`unknown` tokens and zero counts instead of failing.
pub fn derive_paths(item: &ProjectedItem) -> DerivedPaths {
    let artifact_type = item
        .artifact_type
        .as_deref()
        .unwrap_or("UNKNOWN")
        .to_uppercase();
    let artifact_id = item.artifact_id.as_deref().unwrap_or("UNKNOWN_ID");
    let env = item.use_env_last.as_deref().unwrap_or("unknown");
    let capability = item.capability.as_deref().unwrap_or("unknown");

    let source_path = format!("Raw/{}/{}.py", artifact_type, artifact_id);
    let explainer_path = format!("Raw/{}/{}.explainer.md", artifact_type, artifact_id);

    let artifacts_path = match artifact_type.as_str() {
        "PYN" => {
            let sid_count = item.sid_count.unwrap_or(0);
            format!(
                "Artifacts/PY/{}/SID-count_{:03}/{}/",
                env, sid_count, artifact_id
            )
        }
        "SID" => {
            let cid_count = item.cid_count.unwrap_or(0);
            let seq_sig = sequence_signature(item.cid_sequence.as_deref());
            format!(
                "Artifacts/SID/{}/CID-count_{:03}/SEQ_{}/{}/",
                env, cid_count, seq_sig, artifact_id
            )
        }
        "CID" => format!("Artifacts/CID/{}/CAP_{}/", artifact_id, capability),
        _ => format!("Artifacts/UNKNOWN/{}/{}/", env, artifact_id),
    };

    DerivedPaths {
        source_path,
        explainer_path,
        artifacts_path,
    }
}

/// First 8 hex chars of SHA-256 of the sequence string; `NOSEQ` when empty.
fn sequence_signature(cid_sequence: Option<&str>) -> String {
    match cid_sequence {
        Some(seq) if !seq.is_empty() => short8(&sha256_hex(seq)).to_string(),
        _ => "NOSEQ".to_string(),
    }
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Leading 8 characters, or the whole string when shorter.
pub fn short8(hex: &str) -> &str {
    &hex[..hex.len().min(8)]
}
