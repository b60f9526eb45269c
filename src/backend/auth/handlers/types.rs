/**
 * Authentication Handler Types
 *
 * Request and response bodies of the `/api/auth` endpoints.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::otp::OtpChannel;
use crate::backend::auth::users::User;

/// Request a one-time code for an email address or phone number
#[derive(Deserialize, Serialize, Debug)]
pub struct SendOtpRequest {
    pub channel: OtpChannel,
    pub destination: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SendOtpResponse {
    /// Seconds until the code expires
    pub expires_in: u64,
    /// Seconds until another code may be requested
    pub resend_after: u64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyOtpRequest {
    pub channel: OtpChannel,
    pub destination: String,
    pub code: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyOtpResponse {
    pub verified: bool,
}

/// Create an account once both contacts are verified
#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// Will be hashed before storage
    pub password: String,
}

/// Login request
///
/// `identifier` is either the email address or the phone number.
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Body of `/refresh` and `/logout`
#[derive(Deserialize, Serialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LogoutAllResponse {
    /// Number of refresh tokens revoked
    pub revoked: u64,
}

/// Auth response
///
/// Returned by register, login and refresh.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: u64, user: UserResponse) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        }
    }
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
        }
    }
}
