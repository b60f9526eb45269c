/**
 * API Route Configuration
 *
 * Public endpoints (OTP, register, login, refresh, logout) are mounted as
 * they are. Everything else sits behind `auth_middleware`, applied with
 * `route_layer` so unknown paths still fall through to the 404 fallback.
 *
 * The upload route replaces axum's default body limit with one sized for
 * every document kind at the configured per-file limit.
 */

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::backend::auth::{get_me, login, logout, logout_all, refresh, register, send_otp, verify_otp};
use crate::backend::middleware::auth_middleware;
use crate::backend::registration::{
    delete_document, get_registration, save_draft, submit_registration, upload_documents,
};
use crate::backend::server::state::AppState;
use crate::shared::DocumentKind;

/// Room for multipart boundaries and headers on top of the files
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let upload_limit = DocumentKind::ALL.len() * app_state.uploads.max_file_bytes() + MULTIPART_OVERHEAD_BYTES;

    let public = Router::new()
        .route("/api/auth/otp/send", post(send_otp))
        .route("/api/auth/otp/verify", post(verify_otp))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout));

    let protected = Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/gis/registration", get(get_registration))
        .route("/api/gis/registration/draft/{tab}", put(save_draft))
        .route(
            "/api/gis/registration/documents",
            post(upload_documents)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        .route("/api/gis/registration/documents/{kind}", delete(delete_document))
        .route("/api/gis/registration/submit", post(submit_registration))
        .route_layer(from_fn_with_state(app_state, auth_middleware));

    router.merge(public).merge(protected)
}
