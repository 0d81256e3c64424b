//! Current-view assembly: collapse the append-only log into one projected
//! item per distinct `(artifact_type, artifact_id)` pair.
//!
//! Reads are schema-tolerant. Every field is looked up through an ordered
//! resolution chain — the row's own columns first, then keys of the parsed
//! `metadata_json` object — so the projector keeps working when a column has
//! not been promoted yet or has been renamed. A missing core column is
//! reported once as a schema-drift warning, never an error.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use warehouse_registry::RawRow;

/// Columns the registry schema promises. Anything else (environment, content
/// hash, sequence, description) normally arrives via `metadata_json`.
const CORE_COLUMNS: [&str; 13] = [
    "timestamp_utc",
    "scan_id",
    "artifact_type",
    "artifact_id",
    "parent_id",
    "supersedes_id",
    "superseded_by_id",
    "pyn_id",
    "sid_count",
    "cid_count",
    "capability",
    "standalone_status",
    "metadata_json",
];

/// One artifact as the materializer sees it: identity, last-seen fields, and
/// the three derived paths (filled in by the path deriver, not stored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedItem {
    pub artifact_type: Option<String>,
    pub artifact_id: Option<String>,
    pub use_env_last: Option<String>,
    pub capability: Option<String>,
    pub sid_count: Option<i64>,
    pub cid_count: Option<i64>,
    pub cid_sequence: Option<String>,
    pub code_hash_full: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub explainer_path: String,
    #[serde(default)]
    pub artifacts_path: String,
}

/// Ordered resolution chain over named lookups.
///
/// Sources are consulted in registration order; the first one holding a
/// non-null, non-empty value for a name wins. New fallback sources are added
/// with [`FieldResolver::with_source`] without touching call sites.
pub struct FieldResolver<'a> {
    sources: Vec<&'a serde_json::Map<String, Value>>,
}

impl<'a> FieldResolver<'a> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: &'a serde_json::Map<String, Value>) -> Self {
        self.sources.push(source);
        self
    }

    /// First present value for `name`, in source order. Nulls and empty
    /// strings count as absent and fall through to the next source.
    pub fn resolve(&self, name: &str) -> Option<&'a Value> {
        self.sources.iter().find_map(|source| {
            source
                .get(name)
                .filter(|v| !v.is_null() && v.as_str() != Some(""))
        })
    }

    /// Try several names in order, each through the full source chain.
    pub fn resolve_any(&self, names: &[&str]) -> Option<&'a Value> {
        names.iter().find_map(|name| self.resolve(name))
    }

    /// String-valued field; empty strings count as absent.
    pub fn string_field(&self, names: &[&str]) -> Option<String> {
        self.resolve_any(names)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Integer-valued field, tolerating numeric strings from drifted schemas.
    pub fn int_field(&self, names: &[&str]) -> Option<i64> {
        self.resolve_any(names).and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }
}

impl Default for FieldResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the row's metadata spillover; anything unparsable degrades to an
/// empty object.
pub fn parse_metadata(row: &RawRow) -> serde_json::Map<String, Value> {
    let raw = ["metadata_json", "meta_json"]
        .iter()
        .find_map(|name| row.get(*name))
        .and_then(Value::as_str)
        .unwrap_or("");
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

/// Project one raw row into the item shape. Derived paths stay empty here.
pub fn project_row(row: &RawRow) -> ProjectedItem {
    let metadata = parse_metadata(row);
    let fields = FieldResolver::new().with_source(row).with_source(&metadata);
    item_from_fields(&fields)
}

fn item_from_fields(fields: &FieldResolver<'_>) -> ProjectedItem {
    ProjectedItem {
        artifact_type: fields.string_field(&["artifact_type", "type"]),
        artifact_id: fields.string_field(&["artifact_id", "id"]),
        use_env_last: fields.string_field(&["use_env_last"]),
        capability: fields.string_field(&["capability"]),
        sid_count: fields.int_field(&["sid_count"]),
        cid_count: fields.int_field(&["cid_count"]),
        cid_sequence: fields.string_field(&["cid_sequence", "cid_seq"]),
        code_hash_full: fields.string_field(&["code_hash_full"]),
        description: fields.string_field(&["description"]),
        source_path: String::new(),
        explainer_path: String::new(),
        artifacts_path: String::new(),
    }
}

/// Collapse raw rows (insertion order) into the current view: the latest row
/// per distinct `(artifact_type, artifact_id)` pair, sorted by that pair.
///
/// Contradictory `pyn_id` values for the same artifact across scans are
/// flagged and left unreconciled; lineage is informational and does not enter
/// the structural projection.
pub fn current_view(rows: &[RawRow]) -> Vec<ProjectedItem> {
    let mut latest: BTreeMap<(String, String), ProjectedItem> = BTreeMap::new();
    let mut seen_pyn: HashMap<(String, String), String> = HashMap::new();

    for row in rows {
        let metadata = parse_metadata(row);
        let fields = FieldResolver::new().with_source(row).with_source(&metadata);
        let item = item_from_fields(&fields);
        let key = (
            item.artifact_type.clone().unwrap_or_default(),
            item.artifact_id.clone().unwrap_or_default(),
        );

        if let Some(pyn_id) = fields.string_field(&["pyn_id"]) {
            let previous = seen_pyn.get(&key).cloned();
            match previous {
                Some(previous) if previous != pyn_id => {
                    warn!(
                        artifact_type = %key.0,
                        artifact_id = %key.1,
                        previous = %previous,
                        observed = %pyn_id,
                        "contradictory pyn_id across scans; left unreconciled"
                    );
                }
                None => {
                    seen_pyn.insert(key.clone(), pyn_id);
                }
                _ => {}
            }
        }

        latest.insert(key, item);
    }

    latest.into_values().collect()
}

/// Report core columns missing from the source table, once per run.
pub fn warn_schema_drift(columns: &[String]) {
    for expected in CORE_COLUMNS {
        if !columns.iter().any(|c| c == expected) {
            warn!(
                column = expected,
                "schema drift: expected column missing; reading through metadata fallback"
            );
        }
    }
}
