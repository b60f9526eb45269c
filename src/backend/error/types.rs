/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `HandlerError` - Errors with an explicit status (bad input, auth, conflicts)
 * - `StateError` - Errors related to application state management
 * - `DatabaseError` - sqlx failures; the detail is logged, never returned
 * - `StorageError` - Filesystem failures while storing uploads
 * - `SharedError` - Validation and completeness errors from the shared module
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// Each variant can be converted to an HTTP response.
///
/// ```rust
/// use gis_portal::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// let err = BackendError::unauthorized("Invalid credentials");
/// let err = BackendError::state("Upload store unavailable");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid input, failed authentication, conflicts)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// State management error
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Filesystem error while handling uploaded documents
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::CONFLICT, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `StateError`, `DatabaseError`, `StorageError` - 500
    /// - `SharedError` - 400 for validation, 422 for incomplete forms
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::IncompleteError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
        }
    }

    /// Get the client-facing error message
    ///
    /// Infrastructure failures are reported generically.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { .. } => "Internal server error".to_string(),
            Self::DatabaseError(_) => "Internal server error".to_string(),
            Self::StorageError(_) => "Internal server error".to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }

    /// Missing fields carried by an incomplete-form error
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Self::SharedError(SharedError::IncompleteError { missing }) => Some(missing),
            _ => None,
        }
    }
}
