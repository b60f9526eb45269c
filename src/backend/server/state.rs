/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - the database pool (optional, so the router can still answer `/health`
 *   while the database is down)
 * - the validated configuration
 * - the JWT issuer
 * - the OTP sender
 * - the upload store
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow handlers to extract only the parts of
 * the state they need, e.g. `State(pool): State<Option<SqlitePool>>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::mailer::OtpSender;
use crate::backend::auth::sessions::TokenIssuer;
use crate::backend::error::BackendError;
use crate::backend::registration::storage::UploadStore;
use crate::shared::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<SqlitePool>,

    pub config: Arc<AppConfig>,

    pub tokens: TokenIssuer,

    pub otp_sender: Arc<dyn OtpSender>,

    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(
        db_pool: Option<SqlitePool>,
        config: AppConfig,
        otp_sender: Arc<dyn OtpSender>,
    ) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        let uploads = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
        Self {
            db_pool,
            config: Arc::new(config),
            tokens,
            otp_sender,
            uploads,
        }
    }

    /// The database pool, or 503 when the database is not available
    pub fn pool(&self) -> Result<SqlitePool, BackendError> {
        require_database(self.db_pool.clone())
    }
}

pub fn require_database(pool: Option<SqlitePool>) -> Result<SqlitePool, BackendError> {
    pool.ok_or_else(|| {
        tracing::error!("Database not configured");
        BackendError::unavailable("Database not configured")
    })
}

impl FromRef<AppState> for Option<SqlitePool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<dyn OtpSender> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.otp_sender.clone()
    }
}

impl FromRef<AppState> for UploadStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.uploads.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::mailer::LogSender;
    use axum::http::StatusCode;

    #[test]
    fn test_missing_database_is_unavailable() {
        let state = AppState::new(None, AppConfig::default(), Arc::new(LogSender));
        let err = state.pool().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_state_is_built_from_config() {
        let config = AppConfig::builder()
            .upload_dir("/tmp/gis-uploads")
            .max_upload_bytes(1024)
            .build()
            .unwrap();
        let state = AppState::new(None, config, Arc::new(LogSender));
        assert_eq!(state.uploads.max_file_bytes(), 1024);
        assert_eq!(state.tokens.access_ttl_secs(), state.config.access_token_ttl_secs);
        assert_eq!(<Option<SqlitePool>>::from_ref(&state).is_none(), true);
    }
}
