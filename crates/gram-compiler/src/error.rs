//! Error types for compilation
//!
//! Only a malformed root aborts a compile. Everything else the compiler finds
//! wrong with a recipe is reported as a [`Warning`](crate::model::Warning).

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during compilation
#[derive(Error, Debug)]
pub enum Error {
    /// The document root is not a `Recipe` node
    #[error("compiler expects a Recipe document, found '{found}'")]
    InvalidRoot {
        /// Node type that was found instead
        found: String,
    },

    /// Failed to load an ingredient table
    #[error("invalid ingredient table {path}: {message}")]
    IngredientTable {
        /// Table path
        path: String,
        /// Error description
        message: String,
    },

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Document or configuration error
    #[error(transparent)]
    Core(#[from] gram_core::Error),

    /// Output serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
