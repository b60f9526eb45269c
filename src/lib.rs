//! GIS Portal - Main Library
//!
//! Server side of the member onboarding flow of a drone and GIS services
//! marketplace: phone and email OTP verification, JWT sessions with
//! refresh-token rotation, and a multi-tab member registration form with
//! draft saves, document uploads and submission.
//!
//! # Module Structure
//!
//! - **`shared`** - Plain types with no server dependencies
//!   - Configuration
//!   - Contact normalisation
//!   - Registration form tabs and their validation
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server
//!   - Authentication and sessions
//!   - Registration workflow and document storage
//!   - SQLite persistence through sqlx
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend module and the
//!   `gis-portal-server` binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use gis_portal::backend::server::create_app;
//! use gis_portal::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(AppConfig::from_env()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
