//! In-process test application
//!
//! `TestApp` wires the real router to an in-memory database, a temporary
//! upload directory and a recording OTP sender, and drives it with
//! `tower::ServiceExt::oneshot`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use gis_portal::backend::auth::mailer::{DeliveryError, OtpSender};
use gis_portal::backend::auth::otp::OtpChannel;
use gis_portal::backend::routes::create_router;
use gis_portal::backend::server::AppState;
use gis_portal::shared::{AppConfig, AppConfigBuilder};

use super::database::create_test_pool;

/// OTP sender that keeps every code it was asked to deliver
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(OtpChannel, String, String)>>,
    failures: AtomicUsize,
}

impl RecordingSender {
    /// Make the next `count` deliveries fail
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Most recent code sent to a destination
    pub fn last_code(&self, destination: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, dest, _)| dest == destination)
            .map(|(_, _, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpSender for RecordingSender {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<(), DeliveryError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DeliveryError::Transport("relay refused the message".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel, destination.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub sender: Arc<RecordingSender>,
    pub config: AppConfig,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|builder| builder).await
    }

    /// Build the app with adjusted configuration
    ///
    /// Defaults: bcrypt cost 4, no resend cooldown, 1 MiB upload limit.
    pub async fn with_config<F>(adjust: F) -> Self
    where
        F: FnOnce(AppConfigBuilder) -> AppConfigBuilder,
    {
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let builder = AppConfig::builder()
            .jwt_secret("integration-test-secret-0123456789abcdef")
            .bcrypt_cost(4)
            .otp_resend_cooldown_secs(0)
            .upload_dir(uploads.path())
            .max_upload_bytes(1024 * 1024);
        let config = adjust(builder).build().expect("Invalid test configuration");

        let pool = create_test_pool().await;
        let sender = Arc::new(RecordingSender::default());
        let state = AppState::new(Some(pool.clone()), config.clone(), sender.clone());

        Self {
            router: create_router(state),
            pool,
            sender,
            config,
            uploads,
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        call(self.router.clone(), request).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(json_request(method, uri, token, body)).await
    }

    /// Run a JSON POST on its own task, for requests that must overlap
    pub fn spawn_post(&self, uri: &str, body: Value) -> JoinHandle<(StatusCode, Value)> {
        let request = json_request(Method::POST, uri, None, Some(body));
        tokio::spawn(call(self.router.clone(), request))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// POST a multipart body
    pub async fn upload(&self, uri: &str, token: &str, body: MultipartBody) -> (StatusCode, Value) {
        let (content_type, bytes) = body.finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Number of files currently stored under the upload directory
    pub fn stored_file_count(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|entry| {
                            let path = entry.path();
                            if path.is_dir() { walk(&path) } else { 1 }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(self.uploads.path())
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request")
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("Router failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// Hand-built `multipart/form-data` body
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "gis-portal-test-boundary".to_string(),
            bytes: Vec::new(),
        }
    }

    pub fn file(mut self, field: &str, file_name: &str, content_type: &str, contents: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, field, file_name, content_type
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(contents);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (format!("multipart/form-data; boundary={}", self.boundary), self.bytes)
    }
}

/// A small valid PDF header followed by filler
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len.max(bytes.len()), b'x');
    bytes
}

/// PNG signature followed by filler
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}
