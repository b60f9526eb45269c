//! Authentication Handlers Module
//!
//! HTTP handlers for the `/api/auth` endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── types.rs     - Request and response types
//! ├── otp.rs       - OTP send and verify
//! ├── register.rs  - Account creation
//! ├── login.rs     - Password login
//! ├── refresh.rs   - Refresh token rotation
//! ├── logout.rs    - Logout and logout-all
//! └── me.rs        - Get current user
//! ```
//!
//! # Handlers
//!
//! - **`send_otp`** - POST /api/auth/otp/send
//! - **`verify_otp`** - POST /api/auth/otp/verify
//! - **`register`** - POST /api/auth/register
//! - **`login`** - POST /api/auth/login
//! - **`refresh`** - POST /api/auth/refresh
//! - **`logout`** - POST /api/auth/logout
//! - **`logout_all`** - POST /api/auth/logout-all (access token)
//! - **`get_me`** - GET /api/auth/me (access token)

/// Request and response types
pub mod types;

/// OTP handlers
pub mod otp;

/// Registration handler
pub mod register;

/// Login handler
pub mod login;

/// Refresh handler
pub mod refresh;

/// Logout handlers
pub mod logout;

/// Get current user handler
pub mod me;

pub use types::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserResponse};

pub use otp::{send_otp, verify_otp};
pub use register::register;
pub use login::login;
pub use refresh::refresh;
pub use logout::{logout, logout_all};
pub use me::get_me;
