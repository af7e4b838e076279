//! Common test utilities for certcode integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use tempfile::TempDir;

use certcode_core::{ArtifactRef, Code, CodeRecord};
use certcode_service::{
    create_router, AppState, CertificateRenderer, RenderError, RenderJob, ServiceConfig,
};
use certcode_store::{CodeStore, MemoryStore};

/// Renderer double writing a placeholder JPEG into the certificates directory.
pub struct StubRenderer {
    dir: std::path::PathBuf,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl StubRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CertificateRenderer for StubRenderer {
    async fn render(&self, job: &RenderJob) -> Result<ArtifactRef, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Api {
                status: 500,
                message: "renderer unavailable".into(),
            });
        }

        let file_name = ArtifactRef::default_file_name(&job.code);
        let contents = format!("certificate for {} ({})", job.name, job.category);
        tokio::fs::write(self.dir.join(&file_name), contents)
            .await
            .map_err(|e| RenderError::Configuration(e.to_string()))?;

        Ok(ArtifactRef::from_file_name(&file_name))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server.
    pub store: Arc<MemoryStore>,
    /// The renderer behind the server.
    pub renderer: Arc<StubRenderer>,
    /// Certificates directory (kept alive for test duration).
    pub _certificates_dir: TempDir,
    /// The admin API key.
    pub admin_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub fn new() -> Self {
        let certificates_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(MemoryStore::new());
        let renderer = Arc::new(StubRenderer {
            dir: certificates_dir.path().to_path_buf(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        });

        let admin_api_key = "test-admin-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: certificates_dir.path().to_string_lossy().to_string(),
            certificates_dir: certificates_dir.path().to_string_lossy().to_string(),
            public_base_url: "https://certs.example.com".into(),
            admin_api_key: Some(admin_api_key.clone()),
            render_timeout_seconds: 5,
            max_batch_size: 1000,
            ..ServiceConfig::default()
        };

        let state = AppState::new(store.clone(), renderer.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            renderer,
            _certificates_dir: certificates_dir,
            admin_api_key,
        }
    }

    /// Issue a code with a fixed value, as if from an earlier batch.
    pub fn seed_code(&self, code: &str) -> Code {
        let code = Code::parse(code).expect("valid code");
        self.store
            .insert(&CodeRecord::new(code.clone(), "Kraftakt", Utc::now()))
            .expect("Failed to seed code");
        code
    }

    /// Header name for admin authentication.
    pub fn admin_key_name() -> HeaderName {
        HeaderName::from_static("x-admin-key")
    }

    /// Header value for admin authentication.
    pub fn admin_key_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.admin_api_key).expect("valid header value")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
