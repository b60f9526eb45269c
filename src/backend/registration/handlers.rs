/**
 * Registration Handlers
 *
 * All routes run behind the auth middleware and act on the caller's own
 * profile.
 *
 * - GET    /api/gis/registration                   - Current profile
 * - PUT    /api/gis/registration/draft/{tab}       - Save one tab
 * - POST   /api/gis/registration/documents         - Upload documents
 * - DELETE /api/gis/registration/documents/{kind}  - Remove a document
 * - POST   /api/gis/registration/submit            - Submit for review
 *
 * The first draft save or upload creates the profile. Once submitted the
 * profile is read-only and every write answers 409.
 */

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::registration::db::{
    delete_document as delete_document_row, ensure_draft, get_profile, list_documents, load_tab,
    mark_submitted, save_tab, touch_draft, upsert_document,
};
use crate::backend::registration::model::{
    DocumentResponse, GisProfile, NewDocument, RegistrationResponse,
};
use crate::backend::registration::storage::{StagedUploads, UploadStore};
use crate::backend::server::state::AppState;
use crate::shared::profile::documents::signature_matches;
use crate::shared::profile::{EquipmentDetails, PersonalDetails, ProfessionalDetails};
use crate::shared::{DocumentKind, RegistrationTab, SharedError, TabForm};

const MAX_FILE_NAME_LEN: usize = 255;
const SIGNATURE_LEN: usize = 8;

/// Get the caller's registration
///
/// # Errors
///
/// * `404 Not Found` - No draft has been saved yet
pub async fn get_registration(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<RegistrationResponse>, BackendError> {
    let pool = state.pool()?;
    let profile = load_profile(&pool, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Registration not started"))?;
    let documents = list_documents(&pool, auth.user_id).await?;

    Ok(Json(RegistrationResponse::new(profile, &documents)))
}

/// Merge a partial tab payload into the draft
///
/// # Errors
///
/// * `400 Bad Request` - Malformed payload, invalid values, or the documents tab
/// * `404 Not Found` - Unknown tab
/// * `409 Conflict` - Registration already submitted
pub async fn save_draft(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(tab): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<RegistrationResponse>, BackendError> {
    let pool = state.pool()?;
    let tab = RegistrationTab::from_str(&tab)
        .ok_or_else(|| BackendError::not_found(format!("Unknown registration tab '{}'", tab)))?;

    match tab {
        RegistrationTab::Personal => merge_tab::<PersonalDetails>(&pool, auth.user_id, patch).await?,
        RegistrationTab::Professional => {
            merge_tab::<ProfessionalDetails>(&pool, auth.user_id, patch).await?
        }
        RegistrationTab::Equipment => merge_tab::<EquipmentDetails>(&pool, auth.user_id, patch).await?,
        RegistrationTab::Documents => {
            return Err(BackendError::bad_request(
                "Documents are uploaded with POST /api/gis/registration/documents",
            ));
        }
    }

    tracing::info!("Saved {} tab for user {}", tab.as_str(), auth.user_id);

    let profile = load_profile(&pool, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::state("Draft vanished after save"))?;
    let documents = list_documents(&pool, auth.user_id).await?;
    Ok(Json(RegistrationResponse::new(profile, &documents)))
}

/// Upload one or more documents
///
/// Each multipart field name is a document kind. Files are streamed to disk
/// first; the rows are written in one transaction afterwards. On any failure
/// every file written by this request is removed. Files replaced by the
/// upload are removed after commit.
///
/// # Errors
///
/// * `400 Bad Request` - Unknown field, repeated kind, empty file or no files
/// * `409 Conflict` - Registration already submitted
/// * `413 Payload Too Large` - A file exceeds the size limit
/// * `415 Unsupported Media Type` - Content type not accepted for the kind
pub async fn upload_documents(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<DocumentResponse>>), BackendError> {
    let pool = state.pool()?;

    if let Some(profile) = load_profile(&pool, auth.user_id).await? {
        ensure_editable(&profile)?;
    }

    let mut staged = state.uploads.stage();
    let received = match receive_documents(&state.uploads, &mut staged, auth.user_id, &mut multipart).await {
        Ok(received) if received.is_empty() => {
            staged.discard().await;
            return Err(BackendError::bad_request("No documents in request"));
        }
        Ok(received) => received,
        Err(e) => {
            staged.discard().await;
            return Err(e);
        }
    };

    let replaced = match record_documents(&pool, auth.user_id, &received).await {
        Ok(replaced) => replaced,
        Err(e) => {
            staged.discard().await;
            return Err(e);
        }
    };
    staged.commit();

    for path in replaced {
        state.uploads.remove(&path).await;
    }

    tracing::info!("Stored {} document(s) for user {}", received.len(), auth.user_id);

    let documents = list_documents(&pool, auth.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(documents.iter().filter_map(DocumentResponse::from_record).collect()),
    ))
}

/// Remove an uploaded document
///
/// # Errors
///
/// * `404 Not Found` - Unknown kind, no registration, or nothing uploaded
/// * `409 Conflict` - Registration already submitted
pub async fn delete_document(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(kind): Path<String>,
) -> Result<StatusCode, BackendError> {
    let pool = state.pool()?;
    let kind = DocumentKind::from_str(&kind)
        .ok_or_else(|| BackendError::not_found(format!("Unknown document kind '{}'", kind)))?;

    let mut tx = pool.begin().await?;
    let profile = locked_profile(&mut tx, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Registration not started"))?;
    ensure_editable(&profile)?;

    let stored_path = delete_document_row(&mut *tx, auth.user_id, kind)
        .await?
        .ok_or_else(|| BackendError::not_found("Document not found"))?;
    touch_draft(&mut *tx, auth.user_id).await?;
    tx.commit().await?;

    state.uploads.remove(&stored_path).await;
    tracing::info!("Deleted {} for user {}", kind.as_str(), auth.user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Submit the registration for review
///
/// # Errors
///
/// * `400 Bad Request` - A stored value no longer validates
/// * `404 Not Found` - No registration
/// * `409 Conflict` - Already submitted
/// * `422 Unprocessable Entity` - Required fields or documents missing
pub async fn submit_registration(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> Result<Json<RegistrationResponse>, BackendError> {
    let pool = state.pool()?;

    let mut tx = pool.begin().await?;
    let profile = locked_profile(&mut tx, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Registration not started"))?;
    if !profile.status.is_editable() {
        return Err(BackendError::conflict("Registration already submitted"));
    }

    let today = Utc::now().date_naive();
    profile.personal.validate(today)?;
    profile.professional.validate(today)?;
    profile.equipment.validate(today)?;

    let documents = list_documents(&mut *tx, auth.user_id).await?;
    let missing = profile.missing_for_submission(&documents);
    if !missing.is_empty() {
        tracing::warn!("Incomplete submission for user {}: {:?}", auth.user_id, missing);
        return Err(SharedError::incomplete(missing).into());
    }

    if !mark_submitted(&mut *tx, auth.user_id).await? {
        return Err(BackendError::conflict("Registration already submitted"));
    }
    tx.commit().await?;

    tracing::info!("Registration submitted by user {}", auth.user_id);

    let profile = load_profile(&pool, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::state("Profile vanished after submit"))?;
    Ok(Json(RegistrationResponse::new(profile, &documents)))
}

async fn load_profile(pool: &SqlitePool, user_id: Uuid) -> Result<Option<GisProfile>, BackendError> {
    get_profile(pool, user_id)
        .await?
        .map(GisProfile::try_from)
        .transpose()
}

/// Read the profile inside a write transaction
///
/// A no-op update takes SQLite's write lock first, so the status read here
/// cannot change before the transaction ends.
async fn locked_profile(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: Uuid,
) -> Result<Option<GisProfile>, BackendError> {
    sqlx::query("UPDATE gis_profiles SET user_id = user_id WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    get_profile(&mut **tx, user_id)
        .await?
        .map(GisProfile::try_from)
        .transpose()
}

fn ensure_editable(profile: &GisProfile) -> Result<(), BackendError> {
    if profile.status.is_editable() {
        Ok(())
    } else {
        Err(BackendError::conflict("Registration already submitted"))
    }
}

async fn merge_tab<T>(pool: &SqlitePool, user_id: Uuid, patch: Value) -> Result<(), BackendError>
where
    T: TabForm + Unpin,
{
    let patch: T = serde_json::from_value(patch).map_err(|e| {
        BackendError::bad_request(format!("Invalid {} payload: {}", T::TAB.as_str(), e))
    })?;

    let mut tx = pool.begin().await?;
    ensure_draft(&mut *tx, user_id).await?;
    let profile = locked_profile(&mut tx, user_id)
        .await?
        .ok_or_else(|| BackendError::state("Draft missing after upsert"))?;
    ensure_editable(&profile)?;

    let mut stored: T = load_tab(&mut *tx, user_id).await?;
    stored.merge(patch);
    stored.validate(Utc::now().date_naive())?;

    if !save_tab(&mut *tx, user_id, &stored).await? {
        return Err(BackendError::conflict("Registration already submitted"));
    }
    tx.commit().await?;
    Ok(())
}

async fn record_documents(
    pool: &SqlitePool,
    user_id: Uuid,
    documents: &[NewDocument],
) -> Result<Vec<String>, BackendError> {
    let mut tx = pool.begin().await?;
    ensure_draft(&mut *tx, user_id).await?;
    let profile = locked_profile(&mut tx, user_id)
        .await?
        .ok_or_else(|| BackendError::state("Draft missing after upsert"))?;
    ensure_editable(&profile)?;

    let mut replaced = Vec::new();
    for document in documents {
        if let Some(previous) = upsert_document(&mut *tx, user_id, document).await? {
            replaced.push(previous);
        }
    }
    touch_draft(&mut *tx, user_id).await?;
    tx.commit().await?;
    Ok(replaced)
}

async fn receive_documents(
    store: &UploadStore,
    staged: &mut StagedUploads,
    user_id: Uuid,
    multipart: &mut Multipart,
) -> Result<Vec<NewDocument>, BackendError> {
    let mut received: Vec<NewDocument> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let kind = DocumentKind::from_str(&name)
            .ok_or_else(|| BackendError::bad_request(format!("Unknown document field '{}'", name)))?;
        if received.iter().any(|d| d.kind == kind) {
            return Err(BackendError::bad_request(format!(
                "Document '{}' appears more than once",
                kind.as_str()
            )));
        }

        let document = receive_file(store, staged, user_id, kind, field).await?;
        received.push(document);
    }

    Ok(received)
}

async fn receive_file(
    store: &UploadStore,
    staged: &mut StagedUploads,
    user_id: Uuid,
    kind: DocumentKind,
    mut field: Field<'_>,
) -> Result<NewDocument, BackendError> {
    let content_type = field
        .content_type()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !kind.accepts(&content_type) {
        return Err(BackendError::handler(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Content type '{}' is not accepted for {}", content_type, kind.as_str()),
        ));
    }
    let original_name = field
        .file_name()
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| kind.as_str().to_string());

    let (mut file, path) = staged.create_file(user_id, kind, &content_type).await?;
    let mut size = 0usize;
    let mut head: Vec<u8> = Vec::with_capacity(SIGNATURE_LEN);

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len();
        if size > store.max_file_bytes() {
            return Err(BackendError::handler(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Document '{}' exceeds the {} byte limit",
                    kind.as_str(),
                    store.max_file_bytes()
                ),
            ));
        }
        if head.len() < SIGNATURE_LEN {
            let take = (SIGNATURE_LEN - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    if size == 0 {
        return Err(BackendError::bad_request(format!("Document '{}' is empty", kind.as_str())));
    }
    if !signature_matches(&content_type, &head) {
        return Err(BackendError::handler(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Contents of '{}' do not match {}", kind.as_str(), content_type),
        ));
    }

    Ok(NewDocument {
        kind,
        original_name,
        stored_path: path.to_string_lossy().into_owned(),
        content_type,
        size_bytes: size as u64,
    })
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> BackendError {
    tracing::warn!("Multipart error: {}", e);
    BackendError::handler(e.status(), e.body_text())
}

/// Keep only the final path component of a client-supplied file name
fn sanitize_file_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_LEN)
        .collect()
}
