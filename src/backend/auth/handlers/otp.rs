/**
 * OTP Handlers
 *
 * POST /api/auth/otp/send and POST /api/auth/otp/verify.
 *
 * # Send
 *
 * 1. Normalise the destination for the channel
 * 2. Refuse destinations that already belong to an account (409)
 * 3. Enforce the resend cooldown (429)
 * 4. Store a bcrypt hash of a fresh six-digit code and deliver it
 *
 * # Verify
 *
 * The newest unconsumed challenge for the destination is checked. Every
 * check reserves an attempt before the code is compared; once the limit is
 * reached the challenge is dead and a new code must be requested.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;

use crate::backend::auth::handlers::types::{
    SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::backend::auth::otp::{
    create_challenge, delete_challenge, generate_code, latest_challenge, mark_verified, reserve_attempt,
    OtpChannel, OtpRejection, OTP_LENGTH,
};
use crate::backend::auth::password::{hash_secret, verify_secret};
use crate::backend::auth::users::{get_user_by_email, get_user_by_phone};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Send a one-time code
///
/// # Errors
///
/// * `400 Bad Request` - Malformed email address or phone number
/// * `409 Conflict` - Destination already registered
/// * `429 Too Many Requests` - Within the resend cooldown
/// * `502 Bad Gateway` - The code could not be delivered
pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, BackendError> {
    let pool = state.pool()?;
    let channel = request.channel;
    let destination = channel.normalize(&request.destination)?;
    let config = &state.config;

    let existing = match channel {
        OtpChannel::Email => get_user_by_email(&pool, &destination).await?,
        OtpChannel::Phone => get_user_by_phone(&pool, &destination).await?,
    };
    if existing.is_some() {
        tracing::warn!("OTP requested for registered {}: {}", channel.as_str(), destination);
        return Err(BackendError::conflict(format!(
            "This {} is already registered",
            channel.as_str()
        )));
    }

    if let Some(previous) = latest_challenge(&pool, channel, &destination).await? {
        let wait = previous.resend_wait_secs(Utc::now(), config.otp_resend_cooldown_secs);
        if wait > 0 {
            tracing::warn!("OTP resend for {} inside cooldown", destination);
            return Err(BackendError::too_many_requests(format!(
                "Please wait {} seconds before requesting another code",
                wait
            )));
        }
    }

    let code = generate_code();
    let code_hash = hash_secret(code.clone(), config.bcrypt_cost).await?;
    let challenge = create_challenge(&pool, channel, &destination, &code_hash, config.otp_ttl_secs).await?;

    if let Err(e) = state.otp_sender.deliver(channel, &destination, &code).await {
        tracing::error!("Failed to deliver OTP {}: {}", challenge.id, e);
        // The code never arrived, so it must not hold up a retry
        delete_challenge(&pool, challenge.id).await?;
        return Err(BackendError::handler(
            StatusCode::BAD_GATEWAY,
            "Failed to deliver verification code",
        ));
    }

    tracing::info!("Issued {} OTP challenge {}", channel.as_str(), challenge.id);

    Ok(Json(SendOtpResponse {
        expires_in: config.otp_ttl_secs,
        resend_after: config.otp_resend_cooldown_secs,
    }))
}

/// Verify a one-time code
///
/// # Errors
///
/// * `400 Bad Request` - No pending code, expired code or wrong code
/// * `429 Too Many Requests` - Attempt limit reached
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, BackendError> {
    let pool = state.pool()?;
    let channel = request.channel;
    let destination = channel.normalize(&request.destination)?;
    let code = request.code.trim().to_string();
    let max_attempts = state.config.otp_max_attempts;

    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(BackendError::bad_request(format!(
            "Verification code must be {} digits",
            OTP_LENGTH
        )));
    }

    let challenge = latest_challenge(&pool, channel, &destination)
        .await?
        .ok_or_else(|| {
            tracing::warn!("No pending OTP for {}", destination);
            BackendError::bad_request("No verification code was requested for this destination")
        })?;

    match challenge.check_attempt(Utc::now(), max_attempts) {
        Ok(()) => {}
        Err(OtpRejection::AlreadyVerified) => {
            return Ok(Json(VerifyOtpResponse { verified: true }));
        }
        Err(OtpRejection::Expired) => {
            return Err(BackendError::bad_request(
                "Verification code expired; request a new one",
            ));
        }
        Err(OtpRejection::AttemptsExhausted) => {
            return Err(BackendError::too_many_requests(
                "Too many failed attempts; request a new code",
            ));
        }
    }

    let attempts = reserve_attempt(&pool, challenge.id, max_attempts)
        .await?
        .ok_or_else(|| {
            tracing::warn!("OTP challenge {} exhausted", challenge.id);
            BackendError::too_many_requests("Too many failed attempts; request a new code")
        })?;

    if !verify_secret(code, challenge.code_hash.clone()).await? {
        let remaining = i64::from(max_attempts).saturating_sub(attempts).max(0);
        tracing::warn!("Wrong OTP for challenge {} ({} attempts left)", challenge.id, remaining);
        return Err(BackendError::bad_request(format!(
            "Invalid verification code ({} attempts remaining)",
            remaining
        )));
    }

    mark_verified(&pool, challenge.id).await?;
    tracing::info!("Verified {} OTP challenge {}", channel.as_str(), challenge.id);

    Ok(Json(VerifyOtpResponse { verified: true }))
}
