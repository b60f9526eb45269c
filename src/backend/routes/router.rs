/**
 * Router Creation
 *
 * Assembles the API routes, the health check and the request tracing layer
 * into the final router.
 */

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));

    let router = configure_api_routes(router, app_state.clone());

    let router = router.fallback(|| async {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found", "status": 404 })))
    });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}

/// Liveness plus database reachability
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match &state.db_pool {
        Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        None => false,
    };
    let status = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
        })),
    )
}
