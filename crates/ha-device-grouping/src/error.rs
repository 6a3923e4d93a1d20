//! Error types for the grouping engine
//!
//! Classification itself never fails. These errors only come from building
//! the engine (pattern compilation, configuration) and from loading the
//! externally persisted room assignments.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for building the engine
pub type GroupingResult<T> = Result<T, GroupingError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while building the engine
#[derive(Debug, Error)]
pub enum GroupingError {
    /// A pattern in the built-in tables or the configuration does not compile
    #[error("invalid pattern '{pattern}' in {table}: {source}")]
    InvalidPattern {
        table: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur while loading configuration or room assignments
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to parse JSON
    #[error("failed to parse JSON in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
