//! Service Layer Error Types
//!
//! Every store-level failure is caught at the service boundary and re-signaled
//! as one of these variants, carrying the original message. Absent ids are
//! never errors: updates and deletes report zero affected records instead.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Store connectivity or setup failure (fatal at process scope)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A batch write was rejected outright
    #[error("Bulk write failed: {context}")]
    BulkWriteFailure { context: String },

    /// Reading the node set for materialization failed; no partial tree is returned
    #[error("Failed to read tree data: {context}")]
    ScanFailure { context: String },

    /// Validation failed for a single-record operation
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

impl TreeServiceError {
    /// Create a store unavailable error
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a bulk write failure error
    pub fn bulk_write_failure(context: impl Into<String>) -> Self {
        Self::BulkWriteFailure {
            context: context.into(),
        }
    }

    /// Create a scan failure error
    pub fn scan_failure(context: impl Into<String>) -> Self {
        Self::ScanFailure {
            context: context.into(),
        }
    }
}

impl From<DatabaseError> for TreeServiceError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unavailable() {
            Self::store_unavailable(err.to_string())
        } else {
            Self::bulk_write_failure(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_classification() {
        let unavailable: TreeServiceError =
            DatabaseError::initialization_failed("disk gone").into();
        assert!(matches!(unavailable, TreeServiceError::StoreUnavailable(_)));

        let write: TreeServiceError = DatabaseError::sql_execution("bad statement").into();
        assert!(matches!(write, TreeServiceError::BulkWriteFailure { .. }));
        assert!(write.to_string().contains("bad statement"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: TreeServiceError = ValidationError::MissingField("id".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Node validation failed: Missing required field: id"
        );
    }
}
