/**
 * Refresh Handler
 *
 * POST /api/auth/refresh
 *
 * Exchanges a refresh token for a new access/refresh pair. The presented
 * token is revoked and linked to its successor; see `refresh_tokens` for
 * the reuse rules.
 */

use axum::{extract::State, response::Json};
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::{AuthResponse, RefreshRequest};
use crate::backend::auth::refresh_tokens::rotate_refresh_token;
use crate::backend::auth::sessions::TokenIssuer;
use crate::backend::error::BackendError;
use crate::backend::server::state::require_database;

/// Refresh handler
///
/// # Errors
///
/// * `401 Unauthorized` - Invalid, expired, revoked or replayed token
/// * `503 Service Unavailable` - Database not configured
pub async fn refresh(
    State(pool): State<Option<SqlitePool>>,
    State(tokens): State<TokenIssuer>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let pool = require_database(pool)?;
    let response = rotate_refresh_token(&pool, &tokens, &request.refresh_token).await?;
    Ok(Json(response))
}
