//! Authentication test helpers
//!
//! Walk users through OTP verification and registration against the real
//! router.

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use super::mock_server::TestApp;

pub const TEST_PASSWORD: &str = "s3cure-passw0rd";

/// A registered user and their current session
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn from_auth_response(email: &str, phone: &str, body: &Value) -> Self {
        Self {
            id: body["user"]["id"]
                .as_str()
                .and_then(|id| Uuid::parse_str(id).ok())
                .expect("Response carries no user id"),
            email: email.to_string(),
            phone: phone.to_string(),
            access_token: body["access_token"].as_str().expect("No access token").to_string(),
            refresh_token: body["refresh_token"].as_str().expect("No refresh token").to_string(),
        }
    }
}

/// Unique, already normalised contact details
pub fn unique_contact() -> (String, String) {
    let n = Uuid::new_v4().as_u128();
    let email = format!("pilot{}@example.com", n % 1_000_000_000);
    let phone = format!("9{:09}", n % 1_000_000_000);
    (email, phone)
}

impl TestApp {
    /// Request a code for a destination and return it
    pub async fn send_code(&self, channel: &str, destination: &str) -> String {
        let response = self
            .post(
                "/api/auth/otp/send",
                None,
                json!({ "channel": channel, "destination": destination }),
            )
            .await;
        assert_eq!(response.0, StatusCode::OK, "send failed: {}", response.1);
        self.sender.last_code(destination).expect("No code recorded")
    }

    pub async fn verify_code(&self, channel: &str, destination: &str, code: &str) -> (StatusCode, Value) {
        self.post(
            "/api/auth/otp/verify",
            None,
            json!({ "channel": channel, "destination": destination, "code": code }),
        )
        .await
    }

    /// Send and verify a code in one go
    pub async fn verify_contact(&self, channel: &str, destination: &str) {
        let code = self.send_code(channel, destination).await;
        let response = self.verify_code(channel, destination, &code).await;
        assert_eq!(response.0, StatusCode::OK, "verify failed: {}", response.1);
    }

    /// Full onboarding: verify both contacts and register
    pub async fn register_user(&self, email: &str, phone: &str) -> TestUser {
        self.verify_contact("email", email).await;
        self.verify_contact("phone", phone).await;

        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "full_name": "Test Pilot",
                    "email": email,
                    "phone": phone,
                    "password": TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.0, StatusCode::CREATED, "register failed: {}", response.1);
        TestUser::from_auth_response(email, phone, &response.1)
    }

    pub async fn register_unique_user(&self) -> TestUser {
        let (email, phone) = unique_contact();
        self.register_user(&email, &phone).await
    }
}
