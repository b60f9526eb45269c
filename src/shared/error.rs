//! Shared Error Types
//!
//! This module defines error types produced by the platform-agnostic parts of
//! the crate: identifier normalisation, profile tab validation and
//! completeness checks.
//!
//! # Error Categories
//!
//! - `ValidationError` - A single field carries a malformed value
//! - `IncompleteError` - A form cannot be submitted because required
//!   fields or documents are still missing
//!
//! # Usage
//!
//! ```rust
//! use gis_portal::shared::error::SharedError;
//!
//! let error = SharedError::validation("pincode", "must be 6 digits");
//! ```
use thiserror::Error;

/// Shared error types that can occur in both request handling and pure logic
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Required data is missing
    #[error("Incomplete: missing {}", missing.join(", "))]
    IncompleteError {
        /// Qualified names of the missing fields or documents
        missing: Vec<String>,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new incomplete error
    pub fn incomplete(missing: Vec<String>) -> Self {
        Self::IncompleteError { missing }
    }
}
