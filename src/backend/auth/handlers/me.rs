/**
 * Get Current User Handler
 *
 * GET /api/auth/me
 *
 * Runs behind the auth middleware, which has already verified the access
 * token; the handler only loads the user row.
 */

use axum::{extract::State, response::Json};
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_database;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - Missing or invalid access token (from the middleware)
/// * `404 Not Found` - The user was deleted after the token was issued
pub async fn get_me(
    State(pool): State<Option<SqlitePool>>,
    AuthUser(auth): AuthUser,
) -> Result<Json<UserResponse>, BackendError> {
    let pool = require_database(pool)?;

    let user = get_user_by_id(&pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User not found: {}", auth.user_id);
            BackendError::not_found("User not found")
        })?;

    Ok(Json(UserResponse::from(&user)))
}
