//! Server Module
//!
//! Initialization and shared state of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Database connection and migrations
//! └── init.rs         - App creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: `AppConfig::from_env()` in the binary
//! 2. **Database**: pool opened and migrated; on failure the server starts
//!    without it and data endpoints answer 503
//! 3. **Services**: upload directory, OTP sender, token issuer
//! 4. **Router**: public and protected routes with tracing

/// Application state
pub mod state;

/// Database configuration
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with_sender};
pub use state::AppState;
