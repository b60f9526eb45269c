/**
 * Login Handler
 *
 * POST /api/auth/login
 *
 * The identifier may be the email address or the phone number. Unknown
 * users, malformed identifiers and wrong passwords all produce the same 401
 * so the endpoint does not reveal which accounts exist.
 */

use axum::{extract::State, response::Json};
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::auth::password::verify_secret;
use crate::backend::auth::refresh_tokens::issue_session;
use crate::backend::auth::sessions::TokenIssuer;
use crate::backend::auth::users::get_user_by_identifier;
use crate::backend::error::BackendError;
use crate::backend::server::state::require_database;
use crate::shared::Identifier;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - Unknown user or wrong password
/// * `503 Service Unavailable` - Database not configured
pub async fn login(
    State(pool): State<Option<SqlitePool>>,
    State(tokens): State<TokenIssuer>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let pool = require_database(pool)?;

    let identifier = Identifier::parse(&request.identifier).map_err(|_| {
        tracing::warn!("Malformed login identifier");
        BackendError::unauthorized(INVALID_CREDENTIALS)
    })?;

    let user = get_user_by_identifier(&pool, &identifier)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login for unknown user: {:?}", identifier);
            BackendError::unauthorized(INVALID_CREDENTIALS)
        })?;

    if !verify_secret(request.password, user.password_hash.clone()).await? {
        tracing::warn!("Invalid password for user: {}", user.id);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    let mut conn = pool.acquire().await?;
    let response = issue_session(&mut *conn, &tokens, &user).await?;

    tracing::info!("User logged in: {} ({})", user.id, user.email);

    Ok(Json(response))
}
