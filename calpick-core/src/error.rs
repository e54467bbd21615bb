//! Error types for calpick.
//!
//! The selection engine itself is total; these errors only surface at the
//! edges (configuration, catalog snapshots, persisted selections, export).

use thiserror::Error;

/// Errors that can occur at calpick's I/O edges.
#[derive(Error, Debug)]
pub enum CalPickError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Selection store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid feed URL '{0}'")]
    InvalidUrl(String),
}

impl From<serde_json::Error> for CalPickError {
    fn from(err: serde_json::Error) -> Self {
        CalPickError::Serialization(err.to_string())
    }
}

/// Result type alias for calpick operations.
pub type CalPickResult<T> = Result<T, CalPickError>;
