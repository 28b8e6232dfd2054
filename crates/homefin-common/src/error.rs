//! Unified error types for the homefin workspace.
//!
//! Each higher-level crate defines its own domain-specific error enum that wraps
//! these common variants when appropriate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum HomefinError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// Reconciling the OS account database failed.
    #[error("account provisioning failed: {message}")]
    Account {
        /// Description of the failed provisioning step.
        message: String,
    },

    /// Dropping privileges or replacing the process image failed.
    #[error("privilege transition failed: {message}")]
    Privilege {
        /// Description of the failed transition.
        message: String,
    },

    /// The requested operation is not available on this platform.
    #[error("unsupported on this platform: {message}")]
    Unsupported {
        /// Description of the unavailable operation.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HomefinError>;
