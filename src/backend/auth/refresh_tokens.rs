/**
 * Refresh Token Store and Rotation
 *
 * Refresh tokens are single-use. Exchanging one revokes it and links it to
 * its successor through `replaced_by`. Revocation is a conditional update
 * (`WHERE revoked_at IS NULL`), so of two concurrent exchanges of the same
 * token exactly one succeeds.
 *
 * Presenting a token that was already rotated means it leaked or was
 * replayed: every live refresh token of that user is revoked, forcing a new
 * login on all devices. A token revoked by logout is simply rejected.
 */

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::backend::auth::handlers::types::{AuthResponse, UserResponse};
use crate::backend::auth::sessions::{TokenIssuer, TokenKind};
use crate::backend::auth::users::{get_user_by_id, User};
use crate::backend::error::BackendError;

/// Persisted refresh token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by: Option<Uuid>,
}

pub async fn insert_refresh_token<'e, E>(
    executor: E,
    jti: Uuid,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (jti, user_id, issued_at, expires_at, revoked_at, replaced_by)
        VALUES (?, ?, ?, ?, NULL, NULL)
        "#
    )
    .bind(jti)
    .bind(user_id)
    .bind(issued_at)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_refresh_token(
    pool: &SqlitePool,
    jti: Uuid,
) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
    sqlx::query_as::<_, RefreshTokenRecord>(
        r#"
        SELECT jti, user_id, issued_at, expires_at, revoked_at, replaced_by
        FROM refresh_tokens
        WHERE jti = ?
        "#
    )
    .bind(jti)
    .fetch_optional(pool)
    .await
}

/// Revoke a token, optionally naming its successor
///
/// Returns false when the token was already revoked (or does not exist).
pub async fn revoke_refresh_token<'e, E>(
    executor: E,
    jti: Uuid,
    replaced_by: Option<Uuid>,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = ?, replaced_by = ?
        WHERE jti = ? AND revoked_at IS NULL
        "#
    )
    .bind(Utc::now())
    .bind(replaced_by)
    .bind(jti)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Revoke every live refresh token of a user, returning how many were revoked
pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = ?
        WHERE user_id = ? AND revoked_at IS NULL
        "#
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Sign an access/refresh pair and persist the refresh token id
///
/// Runs on the caller's connection so registration can do it inside the
/// transaction that creates the user.
pub async fn issue_session(
    conn: &mut sqlx::SqliteConnection,
    issuer: &TokenIssuer,
    user: &User,
) -> Result<AuthResponse, BackendError> {
    let access = issuer
        .issue(user.id, &user.email, TokenKind::Access)
        .map_err(|e| BackendError::state(format!("Failed to sign access token: {}", e)))?;
    let refresh = issuer
        .issue(user.id, &user.email, TokenKind::Refresh)
        .map_err(|e| BackendError::state(format!("Failed to sign refresh token: {}", e)))?;

    insert_refresh_token(&mut *conn, refresh.jti, user.id, refresh.issued_at, refresh.expires_at).await?;

    Ok(AuthResponse::new(access.token, refresh.token, issuer.access_ttl_secs(), UserResponse::from(user)))
}

/// Exchange a refresh token for a new session
pub async fn rotate_refresh_token(
    pool: &SqlitePool,
    issuer: &TokenIssuer,
    presented: &str,
) -> Result<AuthResponse, BackendError> {
    let claims = issuer.verify(presented, TokenKind::Refresh).map_err(|e| {
        tracing::warn!("Rejected refresh token: {}", e);
        BackendError::unauthorized("Invalid refresh token")
    })?;
    let jti = claims
        .token_id()
        .map_err(|_| BackendError::unauthorized("Invalid refresh token"))?;

    let record = get_refresh_token(pool, jti)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Unknown refresh token id: {}", jti);
            BackendError::unauthorized("Invalid refresh token")
        })?;

    if record.revoked_at.is_some() {
        if record.replaced_by.is_some() {
            return Err(reject_reuse(pool, record.user_id).await?);
        }
        tracing::warn!("Refresh token {} was already revoked", jti);
        return Err(BackendError::unauthorized("Refresh token revoked"));
    }

    let user = get_user_by_id(pool, record.user_id)
        .await?
        .ok_or_else(|| BackendError::unauthorized("Invalid refresh token"))?;

    let mut tx = pool.begin().await?;

    let access = issuer
        .issue(user.id, &user.email, TokenKind::Access)
        .map_err(|e| BackendError::state(format!("Failed to sign access token: {}", e)))?;
    let refresh = issuer
        .issue(user.id, &user.email, TokenKind::Refresh)
        .map_err(|e| BackendError::state(format!("Failed to sign refresh token: {}", e)))?;

    if !revoke_refresh_token(&mut *tx, jti, Some(refresh.jti)).await? {
        // Lost a race against another exchange of the same token
        tx.rollback().await?;
        return Err(reject_reuse(pool, user.id).await?);
    }

    insert_refresh_token(&mut *tx, refresh.jti, user.id, refresh.issued_at, refresh.expires_at).await?;
    tx.commit().await?;

    tracing::info!("Rotated refresh token for user {}", user.id);

    Ok(AuthResponse::new(access.token, refresh.token, issuer.access_ttl_secs(), UserResponse::from(&user)))
}

/// Revoke the whole session family after a replayed refresh token
async fn reject_reuse(pool: &SqlitePool, user_id: Uuid) -> Result<BackendError, BackendError> {
    let revoked = revoke_all_for_user(pool, user_id).await?;
    tracing::warn!(
        "Refresh token reuse detected for user {}; revoked {} active tokens",
        user_id,
        revoked
    );
    Ok(BackendError::unauthorized("Refresh token reuse detected"))
}
