//! Error types for gram-core

use thiserror::Error;

/// Result type alias for gram-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gram-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse a YAML document or configuration
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to parse a JSON document
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Document file has an extension we cannot decode
    #[error("unsupported document format '{extension}' for {path}")]
    UnsupportedFormat {
        /// Offending path
        path: String,
        /// File extension (empty when absent)
        extension: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
