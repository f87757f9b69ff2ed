//! Error types for LibriSync preferences
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by domain (storage, configuration, general) so callers
//! can tell a failing backend apart from a misconfigured one.
//!
//! ## What is *not* an error
//!
//! A missing key is never reported through this type. Absent preferences fall
//! back to their defaults and an absent library is an empty list. Likewise,
//! adding a book that is already present or updating/removing one that is not
//! are silent no-ops reported as `false`, not as errors.

use thiserror::Error;

/// Result type alias using our PrefsError type
pub type Result<T> = std::result::Result<T, PrefsError>;

/// Main error type for the preferences store
///
/// Backend errors are propagated to the caller unchanged; the façade does not
/// retry or translate them.
#[derive(Error, Debug)]
pub enum PrefsError {
    // ===== Storage Errors =====

    /// Generic storage backend failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A stored value exists but cannot be decoded into the expected shape
    #[error("Invalid data under key '{key}': {message}")]
    InvalidData {
        key: String,
        message: String,
    },

    /// Storage schema migration failed
    #[error("Storage migration failed: {0}")]
    MigrationFailed(String),

    // ===== Configuration/State Errors =====

    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Component used in a state that cannot serve the request
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ===== General Errors =====

    /// Internal error that should not normally occur
    #[error("Internal error: {0}")]
    InternalError(String),

    // ===== External Library Errors =====

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PrefsError {
    /// Build an `InvalidData` error for a stored key
    pub fn invalid_data(key: &str, message: impl Into<String>) -> Self {
        PrefsError::InvalidData {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Poisoned mutex guarding in-process state
    pub(crate) fn poisoned(what: &str) -> Self {
        PrefsError::InternalError(format!("{} lock poisoned", what))
    }

    /// Returns true when the error came from the storage backend itself
    /// rather than from the data it returned
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            PrefsError::StorageError(_)
                | PrefsError::MigrationFailed(_)
                | PrefsError::SqlxError(_)
                | PrefsError::IoError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_message() {
        let err = PrefsError::invalid_data("user_library_books", "expected an array");
        assert_eq!(
            err.to_string(),
            "Invalid data under key 'user_library_books': expected an array"
        );
        assert!(!err.is_backend_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PrefsError = io.into();
        assert!(matches!(err, PrefsError::IoError(_)));
        assert!(err.is_backend_failure());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PrefsError = parse.into();
        assert!(err.to_string().starts_with("JSON serialization error"));
    }
}
