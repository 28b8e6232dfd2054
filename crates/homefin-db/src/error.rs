//! Error types for the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Store`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A query or connection failed inside SQLite.
    #[error("database error: {source}")]
    Sqlx {
        /// Underlying driver error.
        #[from]
        source: sqlx::Error,
    },

    /// The directory holding the database file could not be created.
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A stored date string did not parse as `YYYY-MM-DD`.
    #[error("malformed date {value:?} in time_entries")]
    MalformedDate {
        /// The offending column value.
        value: String,
    },
}

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
