//! Middleware Module
//!
//! HTTP middleware for the backend server.
//!
//! - **`auth`** - Access-token authentication for protected routes
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use gis_portal::backend::middleware::auth_middleware;
//!
//! let protected = Router::new()
//!     .route("/api/auth/me", get(get_me))
//!     .route_layer(from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
