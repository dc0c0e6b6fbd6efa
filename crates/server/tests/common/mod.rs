//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock metadata and trending dependencies injected.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cinetrend_core::{
    config::{ServerConfig, TrendingConfig},
    testing::{MockMetadataClient, MockTrendingStore},
    Config, MetadataClient, SearchConfig, SearchOrchestrator, TmdbConfig, TrendingStore,
};
use cinetrend_server::state::AppState;

/// Re-export fixtures for test convenience
pub use cinetrend_core::testing::fixtures;

/// Bearer token used by the fixture config; must never appear in responses.
pub const TEST_API_KEY: &str = "test-secret-token";

/// Test fixture with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_query() {
///     let fixture = TestFixture::started().await;
///
///     let response = fixture.put("/api/v1/query", json!({ "searchTerm": "alien" })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock metadata API - script search outcomes
    pub metadata: Arc<MockMetadataClient>,
    /// Mock trending store - inspect hits, inject failures
    pub trending: Arc<MockTrendingStore>,
    /// The orchestrator behind the router
    pub orchestrator: Arc<SearchOrchestrator>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture whose orchestrator is not started.
    ///
    /// Query changes are stored but never dispatched.
    pub async fn new() -> Self {
        Self::with_store(MockTrendingStore::new()).await
    }

    /// Create a fixture with a pre-populated trending store.
    pub async fn with_store(store: MockTrendingStore) -> Self {
        let metadata = Arc::new(MockMetadataClient::new());
        let trending = Arc::new(store);

        let config = Config {
            server: ServerConfig::default(),
            metadata: TmdbConfig::with_api_key(TEST_API_KEY),
            search: SearchConfig {
                debounce_ms: 20,
                trending_limit: 5,
            },
            trending: TrendingConfig::default(),
        };

        let orchestrator = Arc::new(SearchOrchestrator::new(
            config.search.clone(),
            Arc::clone(&metadata) as Arc<dyn MetadataClient>,
            Arc::clone(&trending) as Arc<dyn TrendingStore>,
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = cinetrend_server::api::create_router(state);

        Self {
            router,
            metadata,
            trending,
            orchestrator,
        }
    }

    /// Create a fixture with a running orchestrator.
    pub async fn started() -> Self {
        let fixture = Self::new().await;
        fixture.orchestrator.start().await;
        fixture
    }

    /// Poll `GET /api/v1/state` until `predicate` holds.
    pub async fn wait_for_state(&self, predicate: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..200 {
            let response = self.get("/api/v1/state").await;
            if predicate(&response.body) {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("state never matched");
    }

    /// Send a GET request to the test router.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a PUT request with raw string body (for testing malformed JSON).
    pub async fn put_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_body(&bytes),
        }
    }

    /// Send a GET request and return the body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test router.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, bytes) = self.send(request).await;

        TestResponse {
            status,
            body: parse_body(&bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
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

        (status, body_bytes.to_vec())
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}
