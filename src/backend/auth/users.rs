/**
 * User Model and Database Operations
 *
 * A user row is only created once both the email address and the phone
 * number have been proven with an OTP. Both are stored normalised and are
 * unique.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::shared::Identifier;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    pub full_name: String,
    /// Normalised email address
    pub email: String,
    /// Normalised phone number
    pub phone: String,
    /// Hashed password (bcrypt)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create a new user
pub async fn create_user<'e, E>(
    executor: E,
    full_name: &str,
    email: &str,
    phone: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, full_name, email, phone, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, full_name, email, phone, password_hash, created_at, updated_at
        "#
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Get user by email
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, phone, password_hash, created_at, updated_at
        FROM users
        WHERE email = ?
        "#
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Get user by phone number
pub async fn get_user_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, phone, password_hash, created_at, updated_at
        FROM users
        WHERE phone = ?
        "#
    )
    .bind(phone)
    .fetch_optional(pool)
    .await
}

/// Get user by ID
pub async fn get_user_by_id(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, phone, password_hash, created_at, updated_at
        FROM users
        WHERE id = ?
        "#
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Look a user up by whichever identifier they logged in with
pub async fn get_user_by_identifier(
    pool: &SqlitePool,
    identifier: &Identifier,
) -> Result<Option<User>, sqlx::Error> {
    match identifier {
        Identifier::Email(email) => get_user_by_email(pool, email).await,
        Identifier::Phone(phone) => get_user_by_phone(pool, phone).await,
    }
}
