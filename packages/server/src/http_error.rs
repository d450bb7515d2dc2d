//! HTTP error handling
//!
//! Every failed request answers with the same JSON body
//! `{message, code, details?}`; the status is derived from `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use nodetree_core::TreeServiceError;
use serde::{Deserialize, Serialize};

/// JSON error response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "VALIDATION_ERROR" | "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "STORE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        match err {
            TreeServiceError::StoreUnavailable(message) => {
                HttpError::new(format!("Store unavailable: {}", message), "STORE_UNAVAILABLE")
            }
            TreeServiceError::BulkWriteFailure { context } => {
                HttpError::with_details("Bulk write failed", "BULK_WRITE_FAILED", context)
            }
            TreeServiceError::ScanFailure { context } => {
                HttpError::with_details("Failed to read tree data", "SCAN_FAILED", context)
            }
            TreeServiceError::ValidationFailed(e) => {
                HttpError::new(e.to_string(), "VALIDATION_ERROR")
            }
        }
    }
}
