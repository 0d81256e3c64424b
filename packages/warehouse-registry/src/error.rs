use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Malformed optional metadata payload.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing required parent reference.
    #[error("Lineage error: {0}")]
    Lineage(String),

    /// Capability field misused relative to artifact type.
    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub fn validation<E: std::fmt::Display>(e: E) -> Self {
        Self::Validation(e.to_string())
    }

    /// True when the underlying SQLite error is a uniqueness violation on
    /// `(scan_id, artifact_type, artifact_id)`.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RegistryError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = RegistryError::validation("metadata-json is not valid JSON");
        assert_eq!(
            format!("{}", err),
            "Validation error: metadata-json is not valid JSON"
        );
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(RegistryError::Lineage("pyn_id required".to_string()))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(RegistryError::Lineage(_))));
    }

    #[test]
    fn test_unique_violation_detection() {
        let err = RegistryError::Validation("nope".to_string());
        assert!(!err.is_unique_violation());
    }
}
