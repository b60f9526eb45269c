/**
 * Logout Handlers
 *
 * - POST /api/auth/logout revokes one refresh token. Repeating it is
 *   harmless: an already revoked token still yields 204.
 * - POST /api/auth/logout-all (access token) revokes every refresh token of
 *   the caller, signing out all devices once their access tokens expire.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::{LogoutAllResponse, RefreshRequest};
use crate::backend::auth::refresh_tokens::{revoke_all_for_user, revoke_refresh_token};
use crate::backend::auth::sessions::{TokenIssuer, TokenKind};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_database;

/// Revoke the presented refresh token
///
/// # Errors
///
/// * `401 Unauthorized` - The token is not a valid refresh token
pub async fn logout(
    State(pool): State<Option<SqlitePool>>,
    State(tokens): State<TokenIssuer>,
    Json(request): Json<RefreshRequest>,
) -> Result<StatusCode, BackendError> {
    let pool = require_database(pool)?;

    let claims = tokens
        .verify(&request.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            tracing::warn!("Logout with invalid refresh token: {}", e);
            BackendError::unauthorized("Invalid refresh token")
        })?;
    let jti = claims
        .token_id()
        .map_err(|_| BackendError::unauthorized("Invalid refresh token"))?;

    if revoke_refresh_token(&pool, jti, None).await? {
        tracing::info!("User {} logged out", claims.sub);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every refresh token of the authenticated user
pub async fn logout_all(
    State(pool): State<Option<SqlitePool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<LogoutAllResponse>, BackendError> {
    let pool = require_database(pool)?;
    let revoked = revoke_all_for_user(&pool, user.user_id).await?;

    tracing::info!("User {} logged out everywhere ({} tokens revoked)", user.user_id, revoked);

    Ok(Json(LogoutAllResponse { revoked }))
}
