//! Failures raised by the libsql node store
//!
//! Two kinds matter to callers. Setup failures (bad path, missing directory,
//! unreachable file, schema creation) mean the store is gone; everything else
//! is one statement going wrong. [`DatabaseError::is_unavailable`] draws that
//! line, and [`crate::services::TreeServiceError`] maps it to
//! `StoreUnavailable` versus a write or scan failure.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Table or index creation failed on open
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    #[error("Invalid database path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// The directory holding the database file could not be created
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    Libsql(#[from] libsql::Error),

    /// A prepared or executed statement failed; `context` names the statement
    #[error("Statement failed: {context}")]
    StatementFailed { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::StatementFailed {
            context: context.into(),
        }
    }

    /// True for setup failures, false when a single statement was rejected
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::InitializationFailed(_)
                | Self::InvalidPath { .. }
                | Self::PermissionDenied { .. }
                | Self::DirectoryCreationFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(DatabaseError::initialization_failed("boom").is_unavailable());
        assert!(DatabaseError::invalid_path(PathBuf::from("")).is_unavailable());
        assert!(DatabaseError::permission_denied(PathBuf::from("/root/x.db")).is_unavailable());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "read-only fs");
        assert!(DatabaseError::from(io).is_unavailable());

        assert!(!DatabaseError::sql_execution("UNIQUE constraint failed").is_unavailable());
    }

    #[test]
    fn test_statement_failure_keeps_context() {
        let err = DatabaseError::sql_execution("Failed to insert node a: boom");
        assert_eq!(err.to_string(), "Statement failed: Failed to insert node a: boom");
    }
}
