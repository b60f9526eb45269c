//! GIS member registration tests
//!
//! Draft saves, document uploads and submission, driven through the real
//! router with files written to a temporary directory.

#![cfg(feature = "ssr")]

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::*;

const REGISTRATION: &str = "/api/gis/registration";
const DOCUMENTS: &str = "/api/gis/registration/documents";

fn draft_uri(tab: &str) -> String {
    format!("/api/gis/registration/draft/{}", tab)
}

fn complete_personal() -> Value {
    json!({
        "full_name": "Asha Rao",
        "date_of_birth": "1990-04-02",
        "gender": "female",
        "address_line": "12 MG Road",
        "city": "Pune",
        "state": "Maharashtra",
        "pincode": "411001",
    })
}

fn complete_professional() -> Value {
    json!({
        "organization_type": "individual",
        "years_of_experience": 6,
        "services": ["aerial_survey", "mapping"],
        "service_regions": ["Pune", "Mumbai"],
    })
}

fn complete_equipment() -> Value {
    json!({
        "drones": [
            { "manufacturer": "DJI", "model": "Mini 4", "category": "nano" },
            { "manufacturer": "ideaForge", "model": "Q6", "category": "small", "uin": "UA-0001" },
        ],
        "software": ["QGIS"],
        "has_pilot_certificate": false,
    })
}

fn required_documents() -> MultipartBody {
    MultipartBody::new()
        .file("id_proof", "aadhaar.pdf", "application/pdf", &pdf_bytes(256))
        .file("photo", "me.png", "image/png", &png_bytes(128))
}

async fn fill_form(app: &TestApp, token: &str) {
    for (tab, body) in [
        ("personal", complete_personal()),
        ("professional", complete_professional()),
        ("equipment", complete_equipment()),
    ] {
        let response = app.put(&draft_uri(tab), Some(token), body).await;
        assert_status!(response, StatusCode::OK);
    }
}

fn missing_list(body: &Value) -> Vec<String> {
    body["missing"]
        .as_array()
        .expect("missing list")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

// ============================================================================
// Drafts
// ============================================================================

#[tokio::test]
async fn test_registration_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.get(REGISTRATION, None).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = app.put(&draft_uri("personal"), None, complete_personal()).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_not_started() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let response = app.get(REGISTRATION, Some(&user.access_token)).await;
    assert_error!(response, StatusCode::NOT_FOUND, "Registration not started");
}

#[tokio::test]
async fn test_draft_save_merges_fields() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    let response = app
        .put(&draft_uri("personal"), token, json!({ "full_name": "Asha Rao", "city": "Pune" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["status"], "draft");

    let response = app
        .put(&draft_uri("personal"), token, json!({ "city": "Nagpur", "pincode": "440001", "alternate_phone": "98765 43210" }))
        .await;
    assert_status!(response, StatusCode::OK);

    let response = app.get(REGISTRATION, token).await;
    assert_status!(response, StatusCode::OK);
    let personal = &response.1["personal"];
    assert_eq!(personal["full_name"], "Asha Rao");
    assert_eq!(personal["city"], "Nagpur");
    assert_eq!(personal["pincode"], "440001");
    assert_eq!(personal["alternate_phone"], "9876543210");

    let missing = response.1["missing"]["personal"].as_array().expect("personal list").clone();
    assert!(missing.contains(&json!("personal.date_of_birth")));
    assert!(!missing.contains(&json!("personal.city")));
    assert_eq!(response.1["completed_tabs"], json!([]));
}

#[tokio::test]
async fn test_complete_tab_is_reported() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let response = app
        .put(&draft_uri("personal"), Some(&user.access_token), complete_personal())
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["completed_tabs"], json!(["personal"]));
    assert_eq!(response.1["missing"]["personal"], json!([]));
}

#[tokio::test]
async fn test_draft_rejects_invalid_values() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    // A rejected first save rolls back the draft it would have created
    let response = app.put(&draft_uri("personal"), token, json!({ "pincode": "12" })).await;
    assert_error!(response, StatusCode::BAD_REQUEST, "pincode");
    let response = app.get(REGISTRATION, token).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = app.put(&draft_uri("personal"), token, json!({ "city": "Pune" })).await;
    assert_status!(response, StatusCode::OK);

    let response = app.put(&draft_uri("personal"), token, json!({ "pincode": "12" })).await;
    assert_error!(response, StatusCode::BAD_REQUEST, "pincode");

    let response = app
        .put(&draft_uri("personal"), token, json!({ "date_of_birth": "2999-01-01" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = app
        .put(&draft_uri("professional"), token, json!({ "services": ["catering"] }))
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "catering");

    let response = app
        .put(&draft_uri("professional"), token, json!({ "years_of_experience": "six" }))
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Invalid professional payload");

    let response = app
        .put(
            &draft_uri("equipment"),
            token,
            json!({ "drones": [{ "manufacturer": "DJI", "model": "M300", "category": "medium" }] }),
        )
        .await;
    assert_error!(response, StatusCode::BAD_REQUEST, "uin");

    // Nothing invalid was stored
    let response = app.get(REGISTRATION, token).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["personal"]["city"], "Pune");
    assert!(response.1["personal"].get("pincode").is_none());
    assert!(response.1["equipment"].get("drones").is_none());
}

#[tokio::test]
async fn test_draft_unknown_and_documents_tabs() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    let response = app.put(&draft_uri("payment"), token, json!({})).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = app.put(&draft_uri("documents"), token, json!({})).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_drafts_are_per_user() {
    let app = TestApp::new().await;
    let first = app.register_unique_user().await;
    let second = app.register_unique_user().await;

    let response = app
        .put(&draft_uri("personal"), Some(&first.access_token), complete_personal())
        .await;
    assert_status!(response, StatusCode::OK);

    let response = app.get(REGISTRATION, Some(&second.access_token)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_upload_documents() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::CREATED);

    let documents = response.1.as_array().expect("document list");
    assert_eq!(documents.len(), 2);
    let id_proof = documents
        .iter()
        .find(|d| d["kind"] == "id_proof")
        .expect("id proof listed");
    assert_eq!(id_proof["original_name"], "aadhaar.pdf");
    assert_eq!(id_proof["content_type"], "application/pdf");
    assert_eq!(id_proof["size_bytes"], 256);
    assert!(id_proof.get("stored_path").is_none());

    assert_eq!(app.stored_file_count(), 2);
    assert_eq!(count_rows(&app.pool, "registration_documents").await, 2);

    // Uploading starts the draft
    let response = app.get(REGISTRATION, Some(&user.access_token)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["missing"]["documents"], json!([]));
}

#[tokio::test]
async fn test_upload_replaces_existing_document() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::CREATED);

    let body = MultipartBody::new().file("id_proof", "passport.pdf", "application/pdf", &pdf_bytes(512));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::CREATED);

    let documents = response.1.as_array().expect("document list");
    assert_eq!(documents.len(), 2);
    let id_proof = documents.iter().find(|d| d["kind"] == "id_proof").expect("id proof");
    assert_eq!(id_proof["original_name"], "passport.pdf");
    assert_eq!(id_proof["size_bytes"], 512);

    // The old file is gone
    assert_eq!(app.stored_file_count(), 2);
}

#[tokio::test]
async fn test_upload_rejects_wrong_content_type() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let body = MultipartBody::new().file("photo", "me.pdf", "application/pdf", &pdf_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let body = MultipartBody::new().file("id_proof", "notes.txt", "text/plain", b"hello");
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_upload_rejects_mismatched_signature() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    // Claims to be a PNG, starts like a PDF
    let body = MultipartBody::new().file("photo", "me.png", "image/png", &pdf_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_upload_rejects_bad_fields() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let body = MultipartBody::new().file("selfie", "me.png", "image/png", &png_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_error!(response, StatusCode::BAD_REQUEST, "Unknown document field");

    let body = MultipartBody::new()
        .file("photo", "a.png", "image/png", &png_bytes(64))
        .file("photo", "b.png", "image/png", &png_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let body = MultipartBody::new().file("photo", "empty.png", "image/png", b"");
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = app.upload(DOCUMENTS, &user.access_token, MultipartBody::new()).await;
    assert_error!(response, StatusCode::BAD_REQUEST, "No documents in request");

    assert_eq!(app.stored_file_count(), 0);
    assert_eq!(count_rows(&app.pool, "registration_documents").await, 0);
}

#[tokio::test]
async fn test_oversized_upload_leaves_nothing_behind() {
    let app = TestApp::with_config(|b| b.max_upload_bytes(1024)).await;
    let user = app.register_unique_user().await;

    // The valid photo streams first and must be cleaned up with the rest
    let body = MultipartBody::new()
        .file("photo", "me.png", "image/png", &png_bytes(512))
        .file("id_proof", "scan.pdf", "application/pdf", &pdf_bytes(4096));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(app.stored_file_count(), 0);
    assert_eq!(count_rows(&app.pool, "registration_documents").await, 0);
}

#[tokio::test]
async fn test_failed_database_write_discards_new_files() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;

    let body = MultipartBody::new().file("photo", "me.png", "image/png", &png_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(app.stored_file_count(), 1);

    // Every document insert from now on fails inside the transaction
    sqlx::query(
        "CREATE TRIGGER reject_documents BEFORE INSERT ON registration_documents \
         BEGIN SELECT RAISE(ABORT, 'storage offline'); END",
    )
    .execute(&app.pool)
    .await
    .unwrap();

    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.1["error"], "Internal server error");

    // Both new files are gone and the photo it would have replaced is kept
    assert_eq!(app.stored_file_count(), 1);
    let response = app.get(REGISTRATION, Some(&user.access_token)).await;
    let documents = response.1["documents"].as_array().expect("document list");
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["original_name"], "me.png");
}

#[tokio::test]
async fn test_request_body_limit() {
    let app = TestApp::with_config(|b| b.max_upload_bytes(1024)).await;
    let user = app.register_unique_user().await;

    let body = MultipartBody::new().file("id_proof", "huge.pdf", "application/pdf", &pdf_bytes(200 * 1024));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_delete_document() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::CREATED);

    let response = app.delete(&format!("{}/photo", DOCUMENTS), token).await;
    assert_status!(response, StatusCode::NO_CONTENT);
    assert_eq!(app.stored_file_count(), 1);

    let response = app.delete(&format!("{}/photo", DOCUMENTS), token).await;
    assert_error!(response, StatusCode::NOT_FOUND, "Document not found");

    let response = app.delete(&format!("{}/passport", DOCUMENTS), token).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = app.get(REGISTRATION, token).await;
    assert_eq!(response.1["missing"]["documents"], json!(["documents.photo"]));
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_submit_lists_missing_items() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    let response = app.post(&format!("{}/submit", REGISTRATION), token, json!({})).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = app.put(&draft_uri("personal"), token, complete_personal()).await;
    assert_status!(response, StatusCode::OK);

    let response = app.post(&format!("{}/submit", REGISTRATION), token, json!({})).await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = missing_list(&response.1);
    assert!(missing.contains(&"professional.organization_type".to_string()));
    assert!(missing.contains(&"equipment.drones".to_string()));
    assert!(missing.contains(&"documents.id_proof".to_string()));
    assert!(missing.contains(&"documents.photo".to_string()));
    assert!(!missing.iter().any(|m| m.starts_with("personal.")));
}

#[tokio::test]
async fn test_declarations_require_extra_documents() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    fill_form(&app, &user.access_token).await;
    let response = app
        .put(
            &draft_uri("professional"),
            token,
            json!({ "organization_type": "company", "organization_name": "SkyMap Pvt Ltd" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let response = app
        .put(
            &draft_uri("equipment"),
            token,
            json!({ "has_pilot_certificate": true, "pilot_certificate_number": "RPC-1234" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::CREATED);

    let response = app.post(&format!("{}/submit", REGISTRATION), token, json!({})).await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        missing_list(&response.1),
        vec![
            "documents.pilot_certificate".to_string(),
            "documents.company_registration".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_submit_locks_registration() {
    let app = TestApp::new().await;
    let user = app.register_unique_user().await;
    let token = Some(user.access_token.as_str());

    fill_form(&app, &user.access_token).await;
    let response = app.upload(DOCUMENTS, &user.access_token, required_documents()).await;
    assert_status!(response, StatusCode::CREATED);

    let response = app.post(&format!("{}/submit", REGISTRATION), token, json!({})).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["status"], "submitted");
    assert!(response.1["submitted_at"].is_string());
    assert_eq!(
        response.1["completed_tabs"],
        json!(["personal", "professional", "equipment", "documents"])
    );

    // Read-only from here on
    let response = app.put(&draft_uri("personal"), token, json!({ "city": "Nagpur" })).await;
    assert_error!(response, StatusCode::CONFLICT, "already submitted");

    let body = MultipartBody::new().file("photo", "new.png", "image/png", &png_bytes(64));
    let response = app.upload(DOCUMENTS, &user.access_token, body).await;
    assert_status!(response, StatusCode::CONFLICT);

    let response = app.delete(&format!("{}/photo", DOCUMENTS), token).await;
    assert_status!(response, StatusCode::CONFLICT);

    let response = app.post(&format!("{}/submit", REGISTRATION), token, json!({})).await;
    assert_status!(response, StatusCode::CONFLICT);

    let response = app.get(REGISTRATION, token).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.1["status"], "submitted");
    assert_eq!(response.1["personal"]["city"], "Pune");
    assert_eq!(app.stored_file_count(), 2);
}
