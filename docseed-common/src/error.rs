//! Common error types for docseed

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for docseed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the normalizer, the loader and the store
#[derive(Error, Debug)]
pub enum Error {
    /// Missing connection string or invalid configuration (fatal, pre-flight)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fixture file is not valid JSON
    #[error("Malformed fixture {}: {source}", path.display())]
    MalformedFixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Fixture file could not be read
    #[error("Cannot read fixture {}: {source}", path.display())]
    FixtureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store rejected a bulk insert for one entity type
    #[error("Insertion failed for '{entity}': {reason}")]
    Insertion { entity: String, reason: String },

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error outside fixture parsing
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// String is not a 24-character hex object identifier
    #[error("Invalid object id: {0}")]
    InvalidObjectId(String),
}

impl Error {
    /// Re-label a store error as an insertion failure for `entity`
    pub fn into_insertion(self, entity: &str) -> Self {
        match self {
            Error::Insertion { reason, .. } => Error::Insertion {
                entity: entity.to_string(),
                reason,
            },
            other => Error::Insertion {
                entity: entity.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
