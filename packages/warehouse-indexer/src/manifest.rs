//! The published machine-readable index.
//!
//! The manifest is a pure, disposable view over the registry — recomputable
//! at any time. The cached `structural_signature` is the only derived state
//! the system trusts across runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::item::ProjectedItem;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at_utc: String,
    pub schema_version: u32,
    pub structural_signature: String,
    pub source_db: String,
    pub table: String,
    pub item_count: usize,
    pub items: Vec<ProjectedItem>,
}

/// Signature recorded by the previously published manifest, if any.
///
/// Any read or parse failure degrades to `None` — a broken manifest forces a
/// republish instead of failing materialization.
pub fn load_previous_signature(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "previous manifest unreadable; forcing republish");
            return None;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value
            .get("structural_signature")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "previous manifest unparsable; forcing republish");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_serde_roundtrip() {
        let manifest = Manifest {
            generated_at_utc: "2026-02-01T16:05:12Z".to_string(),
            schema_version: SCHEMA_VERSION,
            structural_signature: "ab".repeat(32),
            source_db: "registry/registry.sqlite".to_string(),
            table: "scan_events".to_string(),
            item_count: 0,
            items: vec![],
        };
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_load_previous_signature_missing_file() {
        assert_eq!(
            load_previous_signature(Path::new("/no/such/manifest.json")),
            None
        );
    }
}
