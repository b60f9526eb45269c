//! Backend Module
//!
//! Server-side code of the GIS member portal: an Axum HTTP server backed by
//! SQLite through sqlx. Only compiled with the `ssr` feature.
//!
//! # Architecture
//!
//! - **`server`** - Initialization, application state, database setup
//! - **`routes`** - Route configuration and router assembly
//! - **`auth`** - OTP onboarding, login, JWT sessions
//! - **`registration`** - Multi-tab member registration and documents
//! - **`middleware`** - Access-token authentication
//! - **`error`** - Backend error type and HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── registration/   - Registration workflow
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`; the error renders as
//! `{"error": ..., "status": ...}` with the matching status code.
//! Infrastructure failures are logged and reported as a generic 500.
//!
//! # Example
//!
//! ```rust,no_run
//! use gis_portal::backend::server::create_app;
//! use gis_portal::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(config).await?;
//! # Ok(())
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// GIS member registration
pub mod registration;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use server::{create_app, AppState};
