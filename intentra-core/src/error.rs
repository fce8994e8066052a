//! Error types for intentra-core

use thiserror::Error;

/// Main error type for the intentra-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Scan archive error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (session buffers, last-scan records)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archived row that no longer decodes
    #[error("archive error: {0}")]
    Archive(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Delivery/API error
    #[error("delivery error: {0}")]
    Delivery(String),
}

/// Result type alias for intentra-core
pub type Result<T> = std::result::Result<T, Error>;
