//! Error types for registry loading

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while loading a registry snapshot
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document is not valid JSON or a record has the wrong shape
    #[error("failed to parse registry: {0}")]
    Json(#[from] serde_json::Error),

    /// The document layout is not one the loader understands
    #[error("unrecognized {registry} registry layout")]
    UnexpectedShape { registry: &'static str },
}
