use crate::common::response::ApiError;
use crate::infrastructure::media::MediaToolError;
use crate::infrastructure::storage::StorageError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(String),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Video processing failed: {0}")]
    Processing(#[from] MediaToolError),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Validation(_) => StatusCode::BAD_REQUEST,
            UploadError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UploadError::Forbidden(_) => StatusCode::FORBIDDEN,
            UploadError::NotFound(_) => StatusCode::NOT_FOUND,
            UploadError::Processing(_) | UploadError::Storage(_) | UploadError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            UploadError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to hand back to the client. Server-side failures are
    /// reduced to a generic sentence; the detail goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            UploadError::Processing(_) => "Unable to process video".to_string(),
            UploadError::Storage(_) => "Unable to store video".to_string(),
            UploadError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        UploadError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Internal(err.to_string())
    }
}

impl UploadError {
    pub fn from_multipart(err: MultipartError, limit: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::PayloadTooLarge { limit }
        } else {
            UploadError::Validation(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError(err.client_message(), err.status_code())
    }
}
