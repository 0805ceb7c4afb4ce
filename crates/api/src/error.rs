//! API error types
//!
//! Provides structured error responses for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use courier_storage::StorageError;

/// One missing or invalid request field
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub message: &'static str,
}

impl FieldError {
    /// A required field that is missing or empty
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            message: "must not be empty",
        }
    }
}

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request; every offending field is listed in the response
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Unknown queue, or a token that does not own it
    ///
    /// One uniform response for both cases, so an unauthorized token
    /// cannot probe whether a queue exists.
    #[error("not found")]
    NotFound,

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::QueueNotFound => Self::NotFound,
            StorageError::Backend(message) => Self::Internal(message),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
    /// Offending fields, for validation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let fields = match &self {
            Self::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            fields,
        };

        tracing::warn!(
            error_code = body.error,
            error_message = %body.message,
            status = %status,
            "API error"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
