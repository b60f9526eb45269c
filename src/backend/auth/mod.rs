//! Authentication Module
//!
//! OTP onboarding, password login and JWT sessions with refresh-token
//! rotation.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs             - Module exports and documentation
//! ├── users.rs           - User model and database operations
//! ├── otp.rs             - OTP challenges
//! ├── mailer.rs          - OTP delivery (log, SMTP)
//! ├── password.rs        - bcrypt helpers and password rules
//! ├── sessions.rs        - JWT signing and verification
//! ├── refresh_tokens.rs  - Refresh token store and rotation
//! └── handlers/          - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **OTP**: the client requests and verifies a code for the email address
//!    and for the phone number
//! 2. **Register**: both contacts verified → user created → token pair
//! 3. **Login**: email or phone plus password → token pair
//! 4. **Refresh**: refresh token → new pair, old refresh token revoked
//! 5. **Logout**: refresh token revoked; logout-all revokes every one
//!
//! # Security
//!
//! - Passwords and OTP codes are stored as bcrypt hashes
//! - Access tokens are short-lived; refresh tokens are single-use
//! - Replaying a rotated refresh token revokes the user's whole session family
//! - Invalid credentials return 401 without saying which part was wrong

/// User data model and database operations
pub mod users;

/// OTP challenge storage and rules
pub mod otp;

/// OTP delivery
pub mod mailer;

/// Password rules and bcrypt helpers
pub mod password;

/// JWT token generation and validation
pub mod sessions;

/// Refresh token persistence and rotation
pub mod refresh_tokens;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::types::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
pub use handlers::{get_me, login, logout, logout_all, refresh, register, send_otp, verify_otp};
pub use mailer::{LogSender, OtpSender};
pub use sessions::{Claims, TokenIssuer, TokenKind};
