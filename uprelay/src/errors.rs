use crate::api::models::uploads::UploadRejected;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Client omitted one or both of the required request fields
    #[error("missing file data")]
    MissingInput,

    /// Estimated decoded size exceeds the configured ceiling
    #[error("estimated payload size exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    /// The storage capability rejected or failed the write
    #[error("storage rejected the upload: {message}")]
    Storage { message: String, code: Option<String> },

    /// Any other failure during handling (malformed body, malformed encoding, I/O)
    #[error("{details}")]
    Internal { details: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingInput => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short categorical error string carried in the result envelope.
    ///
    /// These strings are part of the endpoint contract; the client renders them as a fallback
    /// when no `details` are present.
    pub fn category(&self) -> &'static str {
        match self {
            Error::MissingInput => "Missing file data",
            Error::PayloadTooLarge { .. } => "File too large",
            Error::Storage { .. } => "File upload failed",
            Error::Internal { .. } => "Internal server error",
        }
    }

    /// Human-readable cause carried in the envelope `details` field.
    pub fn details(&self) -> String {
        match self {
            Error::MissingInput => "Both fileName and fileData are required".to_string(),
            Error::PayloadTooLarge { limit_bytes } => {
                format!("Maximum file size is {}MB", limit_bytes / (1024 * 1024))
            }
            Error::Storage { message, .. } => message.clone(),
            Error::Internal { details } => details.clone(),
        }
    }

    /// Machine code carried in the envelope, present only for storage-originated failures.
    pub fn code(&self) -> Option<String> {
        match self {
            Error::Storage { code, .. } => code.clone(),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } => {
                tracing::error!("internal error while handling upload: {}", self);
            }
            Error::Storage { message, code } => {
                tracing::error!(code = ?code, "storage error: {}", message);
            }
            Error::MissingInput | Error::PayloadTooLarge { .. } => {
                tracing::debug!("client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = UploadRejected {
            success: false,
            error: self.category().to_string(),
            details: Some(self.details()),
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::PayloadTooLarge { limit_bytes: 5 * 1024 * 1024 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            Error::Storage {
                message: "Bucket not found".to_string(),
                code: Some("404".to_string()),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Internal {
                details: "boom".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_payload_too_large_details_render_in_megabytes() {
        let err = Error::PayloadTooLarge {
            limit_bytes: 5 * 1024 * 1024,
        };
        assert_eq!(err.details(), "Maximum file size is 5MB");
    }

    #[test]
    fn test_code_is_storage_only() {
        let storage = Error::Storage {
            message: "denied".to_string(),
            code: Some("403".to_string()),
        };
        assert_eq!(storage.code().as_deref(), Some("403"));
        assert_eq!(Error::MissingInput.code(), None);
    }
}
