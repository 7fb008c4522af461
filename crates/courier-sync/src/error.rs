//! Error types for courier-sync.
//!
//! This module defines all error types used throughout the courier-sync crate.
//! Transport-level failures live in [`crate::remote::RemoteError`]; the
//! variants here describe what the sync policy made of them.

use std::path::PathBuf;
use thiserror::Error;

use crate::remote::RemoteError;
use crate::route::DeliveryStatus;

/// The main error type for courier-sync operations.
#[derive(Error, Debug)]
pub enum Error {
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

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Another thread panicked while holding the store connection.
    #[error("store connection lock poisoned")]
    StoreLockPoisoned,

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

    // === Sync Errors ===
    /// The backend could not be reached and there is no cached route.
    #[error("unable to fetch route: no connection and no cached data ({source})")]
    NoRouteAvailable {
        /// Why the remote fetch failed.
        #[source]
        source: RemoteError,
    },

    /// The confirmation was queued locally and will be sent later.
    ///
    /// This is a soft failure: the local route already reflects the outcome.
    #[error("confirmation for {point_id} saved offline, will be sent when connection is available")]
    SavedOffline {
        /// The confirmed point.
        point_id: String,
        /// Why the push failed.
        #[source]
        source: RemoteError,
    },

    /// Point details could not be fetched.
    #[error("unable to fetch details for point {point_id}")]
    PointDetailsUnavailable {
        /// The requested point.
        point_id: String,
        /// The underlying failure.
        #[source]
        source: RemoteError,
    },

    /// A backend call failed and no fallback applies.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The configured API base URL is unusable.
    #[error("invalid API base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // === Workflow Errors ===
    /// Only terminal outcomes can be confirmed.
    #[error("cannot confirm a point as {0}")]
    InvalidOutcome(DeliveryStatus),

    /// The point already has a final outcome.
    #[error("point {point_id} is already {status}")]
    AlreadyConfirmed {
        /// The point.
        point_id: String,
        /// Its current status.
        status: DeliveryStatus,
    },

    /// The route has no point with this identifier.
    #[error("no delivery point with id {0}")]
    PointNotFound(String),

    /// An encoded polyline ended in the middle of a value.
    #[error("invalid polyline: truncated at byte {position}")]
    InvalidPolyline {
        /// Offset where decoding ran out of input.
        position: usize,
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
}

/// A specialized Result type for courier-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Check if this error is a soft failure the caller may treat as a warning.
    ///
    /// Recoverable errors leave local state consistent with the user's
    /// action; they should never trigger a rollback.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SavedOffline { .. })
    }

    /// Check if this error means a confirmation was queued for later sync.
    #[must_use]
    pub fn is_offline_queued(&self) -> bool {
        matches!(self, Self::SavedOffline { .. })
    }

    /// Check if this error means there is no route to show at all.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoRouteAvailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_offline_is_recoverable() {
        let err = Error::SavedOffline {
            point_id: "point-003".to_string(),
            source: RemoteError::transport("connection refused"),
        };
        assert!(err.is_recoverable());
        assert!(err.is_offline_queued());
        assert!(err.to_string().contains("point-003"));
        assert!(err.to_string().contains("saved offline"));
    }

    #[test]
    fn test_no_route_available_is_not_recoverable() {
        let err = Error::NoRouteAvailable {
            source: RemoteError::Timeout {
                message: "10s elapsed".to_string(),
            },
        };
        assert!(!err.is_recoverable());
        assert!(err.is_no_data());
        assert!(err.to_string().contains("no cached data"));
    }

    #[test]
    fn test_point_details_unavailable_display() {
        let err = Error::PointDetailsUnavailable {
            point_id: "point-007".to_string(),
            source: RemoteError::transport("reset"),
        };
        assert_eq!(err.to_string(), "unable to fetch details for point point-007");
    }

    #[test]
    fn test_invalid_outcome_display() {
        let err = Error::InvalidOutcome(DeliveryStatus::Pending);
        assert_eq!(err.to_string(), "cannot confirm a point as pending");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
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
    fn test_from_remote_error() {
        let err: Error = RemoteError::transport("dns").into();
        assert!(matches!(err, Error::Remote(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "timeout_secs must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("timeout_secs"));
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
    fn test_invalid_polyline_display() {
        let err = Error::InvalidPolyline { position: 4 };
        assert!(err.to_string().contains("byte 4"));
    }
}
