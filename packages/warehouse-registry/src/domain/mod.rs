//! Domain layer for the scan-event registry.
//!
//! The registry is an append-only time series: one `ScanEvent` row per
//! observed artifact per scan batch. Rows are immutable once written, and the
//! same artifact id may appear across many scans with different counters or
//! lineage. The tuple `(scan_id, artifact_type, artifact_id)` is unique.
//!
//! # Artifact lineage
//!
//! - `PYN`: top-level tracked artifact (originating unit)
//! - `SID`: sequence artifact derived from a PYN
//! - `CID`: capability-scoped artifact derived from a SID
//!
//! Non-PYN rows must carry the owning `pyn_id`; `capability` is required for
//! CID rows and forbidden everywhere else. Lineage references are recorded as
//! given and never validated for existence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Artifact tier in the PYN -> SID -> CID lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArtifactType {
    Pyn,
    Sid,
    Cid,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Pyn => "PYN",
            ArtifactType::Sid => "SID",
            ArtifactType::Cid => "CID",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PYN" => Ok(ArtifactType::Pyn),
            "SID" => Ok(ArtifactType::Sid),
            "CID" => Ok(ArtifactType::Cid),
            _ => Err(RegistryError::Validation(format!(
                "Invalid artifact type: {} (expected PYN, SID or CID)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the artifact can run outside its origin workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandaloneStatus {
    #[default]
    None,
    Inventory,
    Runnable,
}

impl StandaloneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandaloneStatus::None => "none",
            StandaloneStatus::Inventory => "inventory",
            StandaloneStatus::Runnable => "runnable",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(StandaloneStatus::None),
            "inventory" => Ok(StandaloneStatus::Inventory),
            "runnable" => Ok(StandaloneStatus::Runnable),
            _ => Err(RegistryError::Validation(format!(
                "Invalid standalone status: {} (expected none, inventory or runnable)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for StandaloneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller input for one append: a scan event minus the registry-owned fields
/// (timestamp, and usually the scan id).
///
/// # Examples
///
/// ```rust
/// use warehouse_registry::domain::{ArtifactType, EventDraft};
///
/// let draft = EventDraft::new(ArtifactType::Cid, "C1")
///     .with_pyn_id("P1")
///     .with_capability("render");
/// assert!(draft.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Explicit scan-id override; allocated day-scoped when absent.
    pub scan_id: Option<String>,
    pub artifact_type: ArtifactType,
    pub artifact_id: String,
    pub parent_id: Option<String>,
    pub supersedes_id: Option<String>,
    pub superseded_by_id: Option<String>,
    pub pyn_id: Option<String>,
    pub sid_count: i64,
    pub cid_count: i64,
    pub capability: Option<String>,
    pub standalone_status: StandaloneStatus,
    /// Raw JSON object string; canonicalized before insert.
    pub metadata_json: Option<String>,
}

impl EventDraft {
    pub fn new(artifact_type: ArtifactType, artifact_id: impl Into<String>) -> Self {
        Self {
            scan_id: None,
            artifact_type,
            artifact_id: artifact_id.into(),
            parent_id: None,
            supersedes_id: None,
            superseded_by_id: None,
            pyn_id: None,
            sid_count: 0,
            cid_count: 0,
            capability: None,
            standalone_status: StandaloneStatus::None,
            metadata_json: None,
        }
    }

    pub fn with_scan_id(mut self, scan_id: impl Into<String>) -> Self {
        self.scan_id = Some(scan_id.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_supersedes_id(mut self, supersedes_id: impl Into<String>) -> Self {
        self.supersedes_id = Some(supersedes_id.into());
        self
    }

    pub fn with_superseded_by_id(mut self, superseded_by_id: impl Into<String>) -> Self {
        self.superseded_by_id = Some(superseded_by_id.into());
        self
    }

    pub fn with_pyn_id(mut self, pyn_id: impl Into<String>) -> Self {
        self.pyn_id = Some(pyn_id.into());
        self
    }

    pub fn with_counts(mut self, sid_count: i64, cid_count: i64) -> Self {
        self.sid_count = sid_count;
        self.cid_count = cid_count;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_standalone_status(mut self, status: StandaloneStatus) -> Self {
        self.standalone_status = status;
        self
    }

    pub fn with_metadata_json(mut self, metadata_json: impl Into<String>) -> Self {
        self.metadata_json = Some(metadata_json.into());
        self
    }

    /// Guardrails checked at the append boundary, before any write.
    ///
    /// # Errors
    ///
    /// - `Lineage`: non-PYN row without `pyn_id`
    /// - `Capability`: CID row without capability, or capability on a non-CID
    /// - `Validation`: `metadata_json` present but not valid JSON
    pub fn validate(&self) -> Result<()> {
        if self.artifact_type != ArtifactType::Pyn && self.pyn_id.is_none() {
            return Err(RegistryError::Lineage(format!(
                "pyn_id is required for {} rows",
                self.artifact_type
            )));
        }
        match (self.artifact_type, self.capability.as_deref()) {
            (ArtifactType::Cid, None) => {
                return Err(RegistryError::Capability(
                    "capability is required for CID rows".to_string(),
                ));
            }
            (t, Some(_)) if t != ArtifactType::Cid => {
                return Err(RegistryError::Capability(format!(
                    "capability is only allowed for CID rows, not {}",
                    t
                )));
            }
            _ => {}
        }
        if let Some(raw) = &self.metadata_json {
            serde_json::from_str::<serde_json::Value>(raw).map_err(|e| {
                RegistryError::Validation(format!("metadata_json is not valid JSON: {}", e))
            })?;
        }
        Ok(())
    }

    /// Metadata re-serialized compactly with sorted keys, ready for storage.
    /// Call after `validate`; an unparsable payload surfaces as `Validation`.
    pub fn canonical_metadata(&self) -> Result<Option<String>> {
        match &self.metadata_json {
            None => Ok(None),
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
                    RegistryError::Validation(format!("metadata_json is not valid JSON: {}", e))
                })?;
                Ok(Some(serde_json::to_string(&value).map_err(
                    RegistryError::validation,
                )?))
            }
        }
    }
}

/// One immutable registry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub timestamp_utc: DateTime<Utc>,
    pub scan_id: String,
    pub artifact_type: ArtifactType,
    pub artifact_id: String,
    pub parent_id: Option<String>,
    pub supersedes_id: Option<String>,
    pub superseded_by_id: Option<String>,
    pub pyn_id: Option<String>,
    pub sid_count: i64,
    pub cid_count: i64,
    pub capability: Option<String>,
    pub standalone_status: StandaloneStatus,
    pub metadata_json: Option<String>,
}

impl ScanEvent {
    /// Materialize a validated draft into the row shape, with the
    /// registry-owned fields filled in. `metadata_json` should already be
    /// canonicalized via [`EventDraft::canonical_metadata`].
    pub fn from_draft(
        draft: &EventDraft,
        scan_id: String,
        timestamp_utc: DateTime<Utc>,
        metadata_json: Option<String>,
    ) -> Self {
        Self {
            timestamp_utc,
            scan_id,
            artifact_type: draft.artifact_type,
            artifact_id: draft.artifact_id.clone(),
            parent_id: draft.parent_id.clone(),
            supersedes_id: draft.supersedes_id.clone(),
            superseded_by_id: draft.superseded_by_id.clone(),
            pyn_id: draft.pyn_id.clone(),
            sid_count: draft.sid_count,
            cid_count: draft.cid_count,
            capability: draft.capability.clone(),
            standalone_status: draft.standalone_status,
            metadata_json,
        }
    }
}
