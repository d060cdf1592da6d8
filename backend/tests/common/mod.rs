//! Common test utilities for integration tests
//!
//! `TestApp` wraps the full router over a fresh in-memory user store, so
//! these tests need no external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use bac_tutor_backend::{
    config::{AppConfig, PasswordScheme},
    repositories::{InMemoryUserStore, UserStore},
    routes,
    state::AppState,
};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Response captured by the test helpers
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application over an empty in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryUserStore::new()))
    }

    /// Create a test application over the given store
    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        Self::with_config(store, test_config())
    }

    /// Create a test application over the given store and configuration
    pub fn with_config(store: Arc<dyn UserStore>, config: AppConfig) -> Self {
        let state = AppState::new(store, config);
        let app = routes::create_router(state.clone());
        Self { app, state }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a GET request with a bearer token
    pub async fn get_auth(&self, path: &str, token: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with no body
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with a form-encoded body
    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Register a user through the query-string form of `POST /users`
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.post_empty(&format!("/users?username={}&password={}", username, password))
            .await
    }

    /// Log in through `POST /token`
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_form("/token", &format!("username={}&password={}", username, password))
            .await
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::with_secret(TEST_SECRET);
    config.server.port = 0;
    // Lowest bcrypt cost keeps registration fast in tests
    config.password.scheme = PasswordScheme::Bcrypt;
    config.password.bcrypt_cost = 4;
    config
}
