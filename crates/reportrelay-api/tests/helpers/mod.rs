//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p reportrelay-api`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use reportrelay_api::setup::routes;
use reportrelay_api::state::AppState;
use reportrelay_api_client::{UploadClient, UploadError};
use reportrelay_core::{
    BaseConfig, Config, RelayConfig, UploadRecord, UploadRequest, UploadResult, ValidationMode,
};
use reportrelay_processing::{ContentValidator, RelayPipeline, ReportUploader};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const ADMIN_PASSWORD: &str = "test-admin-password";
pub const AUTH_LOGIN: &str = "5700097";
pub const COMPANY_NAME: &str = "R&D <Tyres>";
/// Nothing listens here, so connecting fails at the transport level.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/api.php";

/// What the fake remote endpoint should do.
#[derive(Clone, Copy, Debug)]
pub enum RemoteBehavior {
    Accept,
    Refuse,
    /// Refusal that still lists an earlier accepted upload.
    RefuseWithHistory,
    Unreachable,
}

/// In-memory stand-in for the remote endpoint.
pub struct FakeUploader {
    behavior: RemoteBehavior,
    requests: Mutex<Vec<UploadRequest>>,
}

impl FakeUploader {
    pub fn new(behavior: RemoteBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_file_name(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.file_name().to_string())
    }
}

#[async_trait]
impl ReportUploader for FakeUploader {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let file_name = request.file_name().to_string();
        self.requests.lock().unwrap().push(request.clone());
        match self.behavior {
            RemoteBehavior::Accept => Ok(UploadResult {
                status: true,
                code: 0,
                message: "Report accepted".to_string(),
                records: vec![UploadRecord {
                    date_time: "2024-01-01 09:00:00".to_string(),
                    original_name: file_name,
                }],
            }),
            RemoteBehavior::Refuse => Ok(UploadResult {
                status: false,
                code: 12,
                message: "Duplicate report".to_string(),
                records: Vec::new(),
            }),
            RemoteBehavior::RefuseWithHistory => Ok(UploadResult {
                status: false,
                code: 12,
                message: "Duplicate report".to_string(),
                records: vec![UploadRecord {
                    date_time: "2023-12-25 09:00:00".to_string(),
                    original_name: "older.csv".to_string(),
                }],
            }),
            RemoteBehavior::Unreachable => {
                let client = UploadClient::new(UNREACHABLE_ENDPOINT, Duration::from_secs(2))?;
                client.send(&request).await
            }
        }
    }
}

pub fn test_config(dir: &TempDir) -> RelayConfig {
    RelayConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            log_format: "compact".to_string(),
            http_concurrency_limit: 64,
        },
        base_url: UNREACHABLE_ENDPOINT.to_string(),
        company_name: COMPANY_NAME.to_string(),
        auth_login: AUTH_LOGIN.to_string(),
        auth_token: "test-token".to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        upload_time: "09:00".to_string(),
        upload_day: 1,
        csv_file_path: dir.path().join("report.csv").display().to_string(),
        request_timeout_secs: 5,
        max_file_size_bytes: 4 * 1024,
        validation_mode: ValidationMode::Standard,
        templates_dir: dir.path().join("templates").display().to_string(),
        static_dir: dir.path().join("static").display().to_string(),
    }
}

/// Test application: server, fake remote and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub uploader: Arc<FakeUploader>,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app(behavior: RemoteBehavior) -> TestApp {
    setup_test_app_with(behavior, |_| {})
}

pub fn setup_test_app_with(
    behavior: RemoteBehavior,
    customize: impl FnOnce(&mut RelayConfig),
) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut relay_config = test_config(&temp_dir);
    customize(&mut relay_config);
    let config = Config::new(relay_config);

    let uploader = Arc::new(FakeUploader::new(behavior));
    let pipeline = RelayPipeline::new(
        ContentValidator::new(config.max_file_size_bytes(), config.validation_mode()),
        uploader.clone(),
        config.auth_login(),
        config.auth_token(),
    );
    let state = Arc::new(AppState::new(config.clone(), pipeline));

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        uploader,
        temp_dir,
    }
}
