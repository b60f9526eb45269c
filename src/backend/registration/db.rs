/**
 * Registration Database Operations
 *
 * Tab payloads live in JSON columns of `gis_profiles`, one column per tab.
 * Documents have one row per (user, kind); uploading a kind again replaces
 * the row and hands back the path of the file it pointed to.
 */

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::backend::registration::model::{DocumentRecord, NewDocument, ProfileRow};
use crate::shared::{DocumentKind, RegistrationTab, TabForm};

/// Column holding a tab's JSON payload
fn tab_column(tab: RegistrationTab) -> Result<&'static str, sqlx::Error> {
    match tab {
        RegistrationTab::Personal => Ok("personal"),
        RegistrationTab::Professional => Ok("professional"),
        RegistrationTab::Equipment => Ok("equipment"),
        RegistrationTab::Documents => Err(sqlx::Error::ColumnNotFound(tab.as_str().to_string())),
    }
}

/// Create an empty draft unless the user already has a profile
pub async fn ensure_draft<'e, E>(executor: E, user_id: Uuid) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO gis_profiles (user_id, status, created_at, updated_at)
        VALUES (?, 'draft', ?, ?)
        "#
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_profile<'e, E>(executor: E, user_id: Uuid) -> Result<Option<ProfileRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT user_id, status, personal, professional, equipment, created_at, updated_at, submitted_at
        FROM gis_profiles
        WHERE user_id = ?
        "#
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Load one tab payload; a tab never saved yields the empty payload
pub async fn load_tab<'e, E, T>(executor: E, user_id: Uuid) -> Result<T, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
    T: TabForm + Unpin,
{
    let sql = format!("SELECT {} FROM gis_profiles WHERE user_id = ?", tab_column(T::TAB)?);
    let stored = sqlx::query_scalar::<_, Option<Json<T>>>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(stored.flatten().map(|json| json.0).unwrap_or_default())
}

/// Store a tab payload on a draft profile
///
/// Returns false when the profile is missing or no longer a draft.
pub async fn save_tab<'e, E, T>(executor: E, user_id: Uuid, payload: &T) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
    T: TabForm,
{
    let sql = format!(
        "UPDATE gis_profiles SET {} = ?, updated_at = ? WHERE user_id = ? AND status = 'draft'",
        tab_column(T::TAB)?
    );
    let result = sqlx::query(&sql)
        .bind(Json(payload))
        .bind(Utc::now())
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Bump `updated_at` on a draft profile
pub async fn touch_draft<'e, E>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE gis_profiles SET updated_at = ? WHERE user_id = ? AND status = 'draft'",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn list_documents<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<DocumentRecord>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DocumentRecord>(
        r#"
        SELECT id, user_id, kind, original_name, stored_path, content_type, size_bytes, uploaded_at
        FROM registration_documents
        WHERE user_id = ?
        ORDER BY rowid
        "#
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Insert or replace the document of a kind, returning the replaced file path
pub async fn upsert_document(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    document: &NewDocument,
) -> Result<Option<String>, sqlx::Error> {
    let previous = sqlx::query_scalar::<_, String>(
        "SELECT stored_path FROM registration_documents WHERE user_id = ? AND kind = ?",
    )
    .bind(user_id)
    .bind(document.kind.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO registration_documents
            (id, user_id, kind, original_name, stored_path, content_type, size_bytes, uploaded_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, kind) DO UPDATE SET
            original_name = excluded.original_name,
            stored_path = excluded.stored_path,
            content_type = excluded.content_type,
            size_bytes = excluded.size_bytes,
            uploaded_at = excluded.uploaded_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(document.kind.as_str())
    .bind(&document.original_name)
    .bind(&document.stored_path)
    .bind(&document.content_type)
    .bind(document.size_bytes as i64)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(previous)
}

/// Delete the document of a kind, returning its file path
pub async fn delete_document<'e, E>(
    executor: E,
    user_id: Uuid,
    kind: DocumentKind,
) -> Result<Option<String>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(
        "DELETE FROM registration_documents WHERE user_id = ? AND kind = ? RETURNING stored_path",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(executor)
    .await
}

/// Move a draft to submitted; false when it was not a draft
pub async fn mark_submitted<'e, E>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE gis_profiles
        SET status = 'submitted', submitted_at = ?, updated_at = ?
        WHERE user_id = ? AND status = 'draft'
        "#
    )
    .bind(now)
    .bind(now)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
