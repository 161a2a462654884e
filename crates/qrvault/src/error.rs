//! Error types for qrvault.
//!
//! This module defines all error types used throughout the qrvault crate.
//! Every variant maps onto one of the four kinds the HTTP API reports:
//! invalid input, unauthorized, not found, or a storage/server failure.

use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// The main error type for qrvault operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    /// A required field was missing or empty.
    #[error("{message}")]
    InvalidInput {
        /// Description of what is wrong with the input.
        message: String,
    },

    /// The caller's identifier does not match any known client.
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested record does not exist or is not owned by the caller.
    #[error("record {id} not found")]
    NotFound {
        /// Id of the record that was requested.
        id: i64,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for qrvault operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The HTTP status this error is reported with.
    ///
    /// Anything that is not a caller mistake is a server error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error originated in the storage layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::DatabaseOpen { .. } | Self::DatabaseQuery(_))
    }

    /// Check if this error is a uniqueness constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseQuery(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_error(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(extended_code), None)
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            Error::invalid_input("Missing content or user identification").to_string(),
            "Missing content or user identification"
        );
        assert_eq!(Error::NotFound { id: 7 }.to_string(), "record 7 not found");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::invalid_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::NotFound { id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DatabaseQuery(rusqlite::Error::QueryReturnedNoRows).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_is_storage_error() {
        assert!(Error::DatabaseQuery(rusqlite::Error::InvalidQuery).is_storage_error());
        assert!(!Error::Unauthorized.is_storage_error());
    }

    #[test]
    fn test_is_unique_violation() {
        let err = Error::from(sqlite_error(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert!(err.is_unique_violation());

        let err = Error::from(sqlite_error(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY));
        assert!(!err.is_unique_violation());

        assert!(!Error::Unauthorized.is_unique_violation());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "port must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("port must be greater than 0"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
            assert!(err.is_storage_error());
        }
    }
}
