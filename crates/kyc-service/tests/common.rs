//! Common test utilities for kyc-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use kyc_core::UserId;
use kyc_service::{create_router, AppState, ServiceConfig};
use kyc_store::RocksStore;

/// The reviewer identity header required by privileged requests.
pub const REVIEWER_HEADER: &str = "x-reviewer-id";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            storage_bucket: "kyc-uploads-test".into(),
            events_endpoint: None,
            events_timeout_seconds: 5,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Register the harness user, returning the response body.
    pub async fn create_user(&self) -> Value {
        let response = self
            .server
            .post("/v1/users")
            .json(&json!({
                "user_id": self.test_user_id.to_string(),
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "user_type": "individual"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }

    /// Register a passport document for the harness user, returning its id.
    pub async fn create_document(&self) -> String {
        let response = self
            .server
            .post("/v1/documents")
            .json(&json!({
                "user_id": self.test_user_id.to_string(),
                "document_type": "passport",
                "original_filename": "passport.pdf"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["document_id"]
            .as_str()
            .expect("document_id in response")
            .to_string()
    }

    /// Mark the upload of `document_id` complete, moving it into the queue.
    pub async fn complete_upload(&self, document_id: &str) {
        self.server
            .post(&format!("/v1/documents/{document_id}/complete"))
            .await
            .assert_status_ok();
    }

    /// Create a user with one document already pending review.
    pub async fn seed_pending_document(&self) -> String {
        self.create_user().await;
        let document_id = self.create_document().await;
        self.complete_upload(&document_id).await;
        document_id
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
