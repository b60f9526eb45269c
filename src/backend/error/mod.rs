//! Backend Error Module
//!
//! `BackendError` is what every handler, the auth middleware and the
//! registration workflow return on failure.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - BackendError and its status mapping
//! └── conversion.rs - JSON response rendering
//! ```
//!
//! # Status Mapping
//!
//! Client mistakes carry their own status and message (bad OTP code,
//! duplicate email, oversized upload). Validation failures from the shared
//! form model become 400, incomplete submissions 422 with the list of
//! missing items. Database, storage and state failures are logged and
//! reported as a bare 500.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
