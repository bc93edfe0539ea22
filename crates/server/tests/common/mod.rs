//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling E2E testing without an office
//! engine or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use docbridge_core::{
    testing::{MockConverter, MockFetcher},
    Config, ConversionOrchestrator, Converter, ConverterConfig, ServerConfig, SourceFetcher,
};

/// Re-export fixtures for test convenience
pub use docbridge_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_conversion() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/conversions", json!({
///         "source_url": "https://files.example.com/a.docx",
///         "file_type": "docx",
///         "format": "pdf"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock converter - control engine outcomes
    pub converter: Arc<MockConverter>,
    /// Mock fetcher - control staged content
    pub fetcher: Arc<MockFetcher>,
    /// Temporary directory holding output and staging directories
    pub temp_dir: TempDir,
    /// Artifact output directory
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("alternates");

        let converter = Arc::new(MockConverter::new());
        let fetcher = Arc::new(MockFetcher::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            converter: ConverterConfig::default()
                .with_output_dir(&output_dir)
                .with_temp_root(temp_dir.path().join("tmp")),
        };

        let orchestrator = Arc::new(ConversionOrchestrator::new(
            config.converter.clone(),
            Arc::clone(&converter) as Arc<dyn Converter>,
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
        ));

        let state = Arc::new(docbridge_server::state::AppState::new(config, orchestrator));
        let router = docbridge_server::api::create_router(state);

        Self {
            router,
            converter,
            fetcher,
            temp_dir,
            output_dir,
        }
    }

    /// Directory inline conversions read their sources from.
    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir.join("staging")
    }

    /// Write a file into the staging directory and return its path.
    pub fn staged_file(&self, name: &str, content: &str) -> PathBuf {
        let dir = self.staging_dir();
        std::fs::create_dir_all(&dir).expect("Failed to create staging dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write staged file");
        path
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a DELETE request with JSON body.
    pub async fn delete_with_body(&self, path: &str, body: Value) -> TestResponse {
        self.request("DELETE", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
