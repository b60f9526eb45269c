/**
 * Password and Code Hashing
 *
 * bcrypt is used for both account passwords and OTP codes. Hashing runs on
 * the blocking thread pool so a high cost does not stall the runtime.
 */

use crate::backend::error::BackendError;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Check password strength: at least 8 characters with a letter and a digit
pub fn validate_password(password: &str) -> Result<(), BackendError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(BackendError::bad_request(
            "Password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}

pub async fn hash_secret(secret: String, cost: u32) -> Result<String, BackendError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost))
        .await
        .map_err(|e| BackendError::state(format!("Hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to hash secret: {:?}", e);
            BackendError::state("Failed to hash secret")
        })
}

pub async fn verify_secret(secret: String, hash: String) -> Result<bool, BackendError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(secret, &hash))
        .await
        .map_err(|e| BackendError::state(format!("Hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to verify secret: {:?}", e);
            BackendError::state("Failed to verify secret")
        })
}
