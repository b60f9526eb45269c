/**
 * Server Initialization
 *
 * Builds the application from a validated `AppConfig`:
 *
 * 1. Open the database and apply migrations
 * 2. Create the upload directory
 * 3. Pick the OTP sender
 * 4. Assemble `AppState` and the router
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::mailer::{sender_from_config, OtpSender};
use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Create the application router
pub async fn create_app(config: AppConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing GIS portal backend");

    let otp_sender = sender_from_config(&config)
        .map_err(|e| BackendError::state(format!("Invalid OTP sender configuration: {}", e)))?;

    create_app_with_sender(config, otp_sender).await
}

/// Create the application router with an explicit OTP sender
pub async fn create_app_with_sender(
    config: AppConfig,
    otp_sender: Arc<dyn OtpSender>,
) -> Result<Router<()>, BackendError> {
    let db_pool = load_database(&config.database_url).await;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("Storing uploads under {}", config.upload_dir.display());

    let app_state = AppState::new(db_pool, config, otp_sender);
    let app = create_router(app_state);

    tracing::info!("Router configured");

    Ok(app)
}
