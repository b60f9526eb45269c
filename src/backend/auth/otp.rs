/**
 * OTP Challenges
 *
 * Onboarding proves ownership of an email address and a phone number with a
 * six-digit one-time code per channel. Codes are stored as bcrypt hashes.
 *
 * A challenge moves through: issued → (failed attempts)* → verified →
 * consumed. Registration consumes the verified challenges of both channels
 * in the transaction that creates the user, so a code can back exactly one
 * account.
 */

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::shared::{normalize_email, normalize_phone, SharedError};

/// Number of digits in a code
pub const OTP_LENGTH: usize = 6;

/// Delivery channel of a challenge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    Email,
    Phone,
}

impl OtpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpChannel::Email => "email",
            OtpChannel::Phone => "phone",
        }
    }

    /// Normalise a destination for this channel
    pub fn normalize(&self, destination: &str) -> Result<String, SharedError> {
        match self {
            OtpChannel::Email => normalize_email(destination),
            OtpChannel::Phone => normalize_phone(destination),
        }
    }
}

/// A stored challenge
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub channel: String,
    pub destination: String,
    pub code_hash: String,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub consumed_at: Option<DateTime<Utc>>,
}

/// Why a verification attempt cannot proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpRejection {
    Expired,
    AttemptsExhausted,
    AlreadyVerified,
}

impl OtpChallenge {
    /// Check whether a code may still be tried against this challenge
    pub fn check_attempt(&self, now: DateTime<Utc>, max_attempts: u32) -> Result<(), OtpRejection> {
        if self.verified_at.is_some() {
            return Err(OtpRejection::AlreadyVerified);
        }
        if now >= self.expires_at {
            return Err(OtpRejection::Expired);
        }
        if self.attempts >= i64::from(max_attempts) {
            return Err(OtpRejection::AttemptsExhausted);
        }
        Ok(())
    }

    /// Whether this challenge can still back a registration
    pub fn is_usable_for_registration(&self, now: DateTime<Utc>, window_secs: u64) -> bool {
        match (self.verified_at, self.consumed_at) {
            (Some(verified_at), None) => now - verified_at <= Duration::seconds(window_secs as i64),
            _ => false,
        }
    }

    /// Seconds until another code may be requested
    pub fn resend_wait_secs(&self, now: DateTime<Utc>, cooldown_secs: u64) -> u64 {
        let ready_at = self.created_at + Duration::seconds(cooldown_secs as i64);
        (ready_at - now).num_seconds().max(0) as u64
    }
}

/// Generate a zero-padded numeric code
pub fn generate_code() -> String {
    let max = 10u32.pow(OTP_LENGTH as u32);
    let value = rand::thread_rng().gen_range(0..max);
    format!("{:0width$}", value, width = OTP_LENGTH)
}

pub async fn create_challenge(
    pool: &SqlitePool,
    channel: OtpChannel,
    destination: &str,
    code_hash: &str,
    ttl_secs: u64,
) -> Result<OtpChallenge, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, OtpChallenge>(
        r#"
        INSERT INTO otp_challenges (id, channel, destination, code_hash, attempts, created_at, expires_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        RETURNING id, channel, destination, code_hash, attempts, created_at, expires_at, verified_at, consumed_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(channel.as_str())
    .bind(destination)
    .bind(code_hash)
    .bind(now)
    .bind(now + Duration::seconds(ttl_secs as i64))
    .fetch_one(pool)
    .await
}

/// Most recent unconsumed challenge for a destination
pub async fn latest_challenge<'e, E>(
    executor: E,
    channel: OtpChannel,
    destination: &str,
) -> Result<Option<OtpChallenge>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OtpChallenge>(
        r#"
        SELECT id, channel, destination, code_hash, attempts, created_at, expires_at, verified_at, consumed_at
        FROM otp_challenges
        WHERE channel = ? AND destination = ? AND consumed_at IS NULL
        ORDER BY rowid DESC
        LIMIT 1
        "#
    )
    .bind(channel.as_str())
    .bind(destination)
    .fetch_optional(executor)
    .await
}

/// Reserve one verification attempt, returning the new attempt count
///
/// The increment is conditional on the limit, so concurrent verifies can
/// never check more codes than `max_attempts`. `None` means the challenge is
/// exhausted or was verified in the meantime.
pub async fn reserve_attempt(
    pool: &SqlitePool,
    id: Uuid,
    max_attempts: u32,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE otp_challenges
        SET attempts = attempts + 1
        WHERE id = ? AND verified_at IS NULL AND attempts < ?
        RETURNING attempts
        "#
    )
    .bind(id)
    .bind(i64::from(max_attempts))
    .fetch_optional(pool)
    .await
}

/// Drop a challenge whose code never reached the user
pub async fn delete_challenge(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM otp_challenges WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_verified(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE otp_challenges SET verified_at = ? WHERE id = ? AND verified_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Consume a verified challenge; false if it was consumed concurrently
pub async fn mark_consumed<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE otp_challenges SET consumed_at = ? WHERE id = ? AND consumed_at IS NULL AND verified_at IS NOT NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
