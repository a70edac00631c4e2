//! Common test utilities for API tests
//!
//! Builds the full router over an in-memory store and drives it in-process,
//! so no database or network is needed.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use teamboard_api::app::{build_router, AppState};
use teamboard_api::config::{ApiConfig, Config, JwtConfig, LogFormat, StoreBackend, StoreConfig};
use teamboard_shared::auth::jwt::{create_token, Claims};
use teamboard_shared::store::MemoryStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            database: None,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        log_format: LogFormat::Pretty,
    }
}

/// Router plus a handle on its store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), test_config()));
        Self { app, store }
    }

    /// Bearer header value for `username`
    pub fn auth_header(&self, username: &str) -> String {
        let token = create_token(&Claims::new(username), TEST_SECRET).expect("token");
        format!("Bearer {}", token)
    }

    /// Sends one request and returns the status and parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, self.auth_header(user));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(user), None).await
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn create_project(&self, owner: &str, name: &str) -> String {
        let (status, body) = self
            .post("/v1/projects", owner, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().expect("project id").to_string()
    }

    /// Adds `username` with `role` to the project
    pub async fn add_member(&self, project_id: &str, actor: &str, username: &str, role: &str) {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/members", project_id),
                actor,
                serde_json::json!({ "username": username, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, project_id: &str, actor: &str, body: Value) -> String {
        let (status, body) = self
            .post(&format!("/v1/projects/{}/tasks", project_id), actor, body)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["task"]["id"].as_str().expect("task id").to_string()
    }
}
