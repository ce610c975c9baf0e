//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A fresh SQLite database and upload directory per test (tempfile)
//! - The full router, driven in-process with `tower::ServiceExt::oneshot`
//! - Account/session helpers and a small multipart body builder

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use std::path::PathBuf;
use taskdesk_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, SessionConfig, UploadConfig, DEFAULT_MAX_BODY_BYTES},
};
use taskdesk_shared::{
    auth::middleware::SESSION_COOKIE,
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig as PoolConfig},
    },
};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

/// Test context containing all necessary resources
pub struct TestContext {
    /// Keeps the database file and upload directory alive
    _dir: tempfile::TempDir,
    pub db: sqlx::SqlitePool,
    pub app: Router,
    pub config: Config,
}

/// A response with its body already read
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie this response sets, if any
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(str::to_string)
    }
}

impl TestContext {
    /// Creates a new test context with a fresh database and upload directory
    pub async fn new() -> Self {
        Self::with_body_limit(DEFAULT_MAX_BODY_BYTES).await
    }

    pub async fn with_body_limit(max_body_bytes: usize) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_url = format!("sqlite://{}", dir.path().join("taskdesk.db").display());

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                production: false,
                cors_origins: vec![],
                static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            },
            database: DatabaseConfig {
                url: db_url.clone(),
                max_connections: 5,
            },
            session: SessionConfig {
                secret: "integration-test-secret-at-least-32-bytes".to_string(),
                ttl_hours: 24,
            },
            upload: UploadConfig {
                dir: dir.path().join("uploads"),
                max_body_bytes,
            },
        };

        let db = create_pool(PoolConfig {
            url: db_url,
            ..Default::default()
        })
        .await
        .expect("pool");
        run_migrations(&db).await.expect("migrations");

        let state = AppState::new(db.clone(), config.clone());
        state.uploads.ensure_dir().await.expect("upload dir");
        let app = build_router(state);

        TestContext {
            _dir: dir,
            db,
            app,
            config,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.upload.dir.clone()
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn put(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("PUT", uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("DELETE", uri, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: serde_json::Value,
    ) -> TestResponse {
        self.send(
            request(method, uri, cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/register",
            None,
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Registers `username` and returns a logged-in session cookie
    pub async fn signed_in(&self, username: &str) -> String {
        let registered = self.register(username, PASSWORD).await;
        assert_eq!(registered.status, StatusCode::OK, "{}", registered.text());

        let logged_in = self.login(username, PASSWORD).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.text());

        logged_in.session_cookie().expect("session cookie")
    }

    /// Posts a multipart create-task form
    pub async fn create_task(&self, cookie: &str, form: &Multipart) -> TestResponse {
        self.send(
            request("POST", "/api/tasks", Some(cookie))
                .header(header::CONTENT_TYPE, form.content_type())
                .body(Body::from(form.body()))
                .unwrap(),
        )
        .await
    }

    /// Tasks visible to `cookie`'s user
    pub async fn list_tasks(&self, cookie: &str) -> Vec<serde_json::Value> {
        let response = self.get("/api/tasks", Some(cookie)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["tasks"].as_array().cloned().unwrap_or_default()
    }

    /// Counts all tasks in the database regardless of owner
    pub async fn task_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM task")
            .fetch_one(&self.db)
            .await
            .unwrap()
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

const BOUNDARY: &str = "taskdesk-test-boundary";

/// Minimal multipart/form-data builder
#[derive(Default)]
pub struct Multipart {
    parts: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(data);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn body(&self) -> Vec<u8> {
        let mut body = self.parts.clone();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}

/// The usual "title + priority" form
pub fn task_form(title: &str, priority: &str) -> Multipart {
    Multipart::new().text("title", title).text("priority", priority)
}
