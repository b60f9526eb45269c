/**
 * Database Configuration
 *
 * Opens the SQLite pool named by `DATABASE_URL` and applies the migrations
 * in `migrations/`.
 */

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub type DatabaseConfig = Option<SqlitePool>;

const MAX_CONNECTIONS: u32 = 8;

/// Connect and migrate, failing on any error
pub async fn connect_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}

/// Connect for the server; a failure leaves the database disabled
///
/// The router still starts so `/health` can report the outage; data
/// endpoints answer 503 until the server is restarted with a working
/// database.
pub async fn load_database(database_url: &str) -> DatabaseConfig {
    tracing::info!("Connecting to database...");

    match connect_database(database_url).await {
        Ok(pool) => {
            tracing::info!("Database ready, migrations applied");
            Some(pool)
        }
        Err(e) => {
            tracing::error!("Failed to open database: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            None
        }
    }
}
