//! Routes Module
//!
//! HTTP route configuration.
//!
//! - **`router`** - Final router: health check, fallback, tracing
//! - **`api_routes`** - `/api/auth` and `/api/gis/registration` endpoints

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
