/**
 * Register Handler
 *
 * POST /api/auth/register
 *
 * # Registration Process
 *
 * 1. Validate name and password, normalise email and phone
 * 2. Reject contacts that already belong to an account (409)
 * 3. Require a verified, unconsumed OTP challenge for both contacts
 * 4. In one transaction: create the user, consume both challenges and store
 *    the first refresh token
 * 5. Return the token pair and user info
 */

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::{AuthResponse, RegisterRequest};
use crate::backend::auth::otp::{latest_challenge, mark_consumed, OtpChallenge, OtpChannel};
use crate::backend::auth::password::{hash_secret, validate_password};
use crate::backend::auth::refresh_tokens::issue_session;
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_phone};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::{normalize_email, normalize_phone};

const MAX_NAME_LEN: usize = 100;

/// Register handler
///
/// # Errors
///
/// * `400 Bad Request` - Invalid input or a contact that was not verified
/// * `409 Conflict` - Email or phone already registered
/// * `503 Service Unavailable` - Database not configured
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    let pool = state.pool()?;

    let full_name = request.full_name.trim();
    if full_name.is_empty() || full_name.chars().count() > MAX_NAME_LEN {
        return Err(BackendError::bad_request(format!(
            "Full name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }
    validate_password(&request.password)?;
    let email = normalize_email(&request.email)?;
    let phone = normalize_phone(&request.phone)?;

    tracing::info!("Register request for {}", email);

    if get_user_by_email(&pool, &email).await?.is_some() {
        tracing::warn!("Email already registered: {}", email);
        return Err(BackendError::conflict("Email already registered"));
    }
    if get_user_by_phone(&pool, &phone).await?.is_some() {
        tracing::warn!("Phone already registered: {}", phone);
        return Err(BackendError::conflict("Phone number already registered"));
    }

    let window = state.config.otp_verified_window_secs;
    let email_challenge = verified_challenge(&pool, OtpChannel::Email, &email, window)
        .await?
        .ok_or_else(|| BackendError::bad_request("Email address has not been verified"))?;
    let phone_challenge = verified_challenge(&pool, OtpChannel::Phone, &phone, window)
        .await?
        .ok_or_else(|| BackendError::bad_request("Phone number has not been verified"))?;

    let password_hash = hash_secret(request.password, state.config.bcrypt_cost).await?;

    let mut tx = pool.begin().await?;

    let user = create_user(&mut *tx, full_name, &email, &phone, &password_hash)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    tracing::warn!("Concurrent registration for {}", email);
                    return BackendError::conflict("Email or phone number already registered");
                }
            }
            BackendError::from(e)
        })?;

    for challenge in [&email_challenge, &phone_challenge] {
        if !mark_consumed(&mut *tx, challenge.id).await? {
            tracing::warn!("OTP challenge {} consumed concurrently", challenge.id);
            return Err(BackendError::conflict("Verification code already used"));
        }
    }

    let response = issue_session(&mut *tx, &state.tokens, &user).await?;
    tx.commit().await?;

    tracing::info!("User registered: {} ({})", user.id, user.email);

    Ok((StatusCode::CREATED, Json(response)))
}

async fn verified_challenge(
    pool: &SqlitePool,
    channel: OtpChannel,
    destination: &str,
    window_secs: u64,
) -> Result<Option<OtpChallenge>, BackendError> {
    let challenge = latest_challenge(pool, channel, destination).await?;
    Ok(challenge.filter(|c| c.is_usable_for_registration(Utc::now(), window_secs)))
}
