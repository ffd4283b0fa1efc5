//! Vault error types with HTTP status code mapping.
//!
//! [`BackupError`] is the central error type of the engine. Only
//! [`BackupError::Source`], [`BackupError::Write`] and
//! [`BackupError::Serialization`] fail a run; the remaining variants are
//! either absorbed into run reports or raised at startup / request parsing.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: days must be between 1 and 3650"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Engine error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category     | HTTP Status               |
/// |-----------|--------------|---------------------------|
/// | 1000–1999 | Validation   | 400 Bad Request           |
/// | 3000–3999 | Server       | 500 Internal Server Error |
/// | 5000–5999 | Upstream     | 502 Bad Gateway           |
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// The record source could not be reached or the query failed.
    #[error("record source error: {0}")]
    Source(String),

    /// The local filesystem rejected a directory creation, write or rename.
    #[error("write error at {}: {source}", path.display())]
    Write {
        /// Path that was being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tabular serializer failed to encode a row.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Remote upload failed.
    #[error("replication error: {0}")]
    Replication(String),

    /// A configuration value is present but invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BackupError {
    /// Builds a [`BackupError::Write`] for the given path.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` when this error fails a backup or export run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Source(_) | Self::Write { .. } | Self::Serialization(_)
        )
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Config(_) => 1002,
            Self::Write { .. } => 3001,
            Self::Serialization(_) => 3002,
            Self::Source(_) => 5001,
            Self::Replication(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Write { .. } | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Source(_) | Self::Replication(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<csv::Error> for BackupError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for BackupError {
    fn from(err: sqlx::Error) -> Self {
        Self::Source(err.to_string())
    }
}

impl IntoResponse for BackupError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_and_write_errors_are_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(BackupError::Source("down".into()).is_fatal());
        assert!(BackupError::write("backups/x.csv", io).is_fatal());
        assert!(BackupError::Serialization("bad".into()).is_fatal());
        assert!(!BackupError::Replication("timeout".into()).is_fatal());
        assert!(!BackupError::InvalidRequest("days".into()).is_fatal());
    }

    #[test]
    fn write_error_message_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = BackupError::write("backups/inquiries_backup_20240101_000000.csv", io);
        let msg = err.to_string();
        assert!(msg.contains("inquiries_backup_20240101_000000.csv"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn status_codes_follow_category() {
        assert_eq!(
            BackupError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BackupError::Source("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(BackupError::Source("x".into()).error_code(), 5001);
    }
}
