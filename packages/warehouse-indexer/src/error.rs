use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Registry database or table absent at materialization time.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Registry error: {0}")]
    Registry(#[from] warehouse_registry::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
