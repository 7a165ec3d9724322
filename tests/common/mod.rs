#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

use shiftmaster::create_app;
use shiftmaster::seed::SeedSummary;

pub const ADMIN: (&str, &str) = ("admin@example.com", "Password123$!");
pub const MANAGER: (&str, &str) = ("manager@example.com", "Manager123$!");
pub const USER: (&str, &str) = ("user@example.com", "User123$!");
pub const OTHER_ADMIN: (&str, &str) = ("otheradmin@example.com", "OtherAdmin123$!");
pub const SUPER_ADMIN: (&str, &str) = ("superadmin@example.com", "SuperAdmin123$!");

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub seed: SeedSummary,
    _dir: TempDir,
}

/// Fresh temp-file database with migrations and demo data applied.
pub async fn spawn() -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;
    let seed = shiftmaster::seed::run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;

    Ok(TestApp {
        app,
        pool,
        seed,
        _dir: dir,
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> Result<TestResponse> {
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, (email, password): (&str, &str)) -> Result<String> {
        let resp = self
            .request(Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": password })))
            .await?;
        assert_eq!(resp.status, StatusCode::OK, "login failed for {email}: {}", resp.body);

        resp.body["token"]
            .as_str()
            .map(String::from)
            .context("login response without token")
    }
}

/// Values of `field` across a JSON array response.
pub fn strings(body: &Value, field: &str) -> Vec<String> {
    body.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
