/**
 * Authentication Middleware
 *
 * Protects routes that need a signed-in user. The middleware reads the
 * `Authorization: Bearer <token>` header, verifies it as an access token,
 * checks that the user still exists and attaches an `AuthenticatedUser` to
 * the request extensions. Handlers read it back with the `AuthUser`
 * extractor.
 *
 * Refresh tokens are rejected here; they are only accepted by `/refresh`
 * and `/logout`.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::sessions::TokenKind;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user information
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Authentication middleware
///
/// # Errors
///
/// * `401 Unauthorized` - Missing header, bad format, invalid or expired
///   token, refresh token presented, or user no longer exists
/// * `503 Service Unavailable` - Database not configured
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(&request)?;

    let claims = app_state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(|e| {
            tracing::warn!("Invalid access token: {}", e);
            BackendError::unauthorized("Invalid or expired token")
        })?;

    let user_id = claims.user_id().map_err(|e| {
        tracing::warn!("Invalid user ID in token: {}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let pool = app_state.pool()?;
    if get_user_by_id(&pool, user_id).await?.is_none() {
        tracing::warn!("Token for unknown user: {}", user_id);
        return Err(BackendError::unauthorized("Invalid or expired token"));
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str, BackendError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            BackendError::unauthorized("Missing authorization header")
        })?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            BackendError::unauthorized("Invalid authorization header")
        })
}

/// Extractor for the user attached by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Not authenticated")
            })?;

        Ok(AuthUser(user))
    }
}
