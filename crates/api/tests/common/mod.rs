//! Shared harness for HTTP-level integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use segment3d_api::auth::google::{GoogleError, GoogleIdentity, GoogleUserInfo};
use segment3d_api::auth::jwt::JwtConfig;
use segment3d_api::config::ServerConfig;
use segment3d_api::router::build_app_router;
use segment3d_api::state::AppState;
use segment3d_events::RelayConfig;
use segment3d_pipeline::{AssetLifecycle, PgAssetStore, ThumbnailError, ThumbnailSource};

pub const WORKER_TOKEN: &str = "test-worker-token";

/// Google tokens of the form `valid:<email>` resolve to that account.
pub const GOOGLE_TOKEN_PREFIX: &str = "valid:";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        storage_server_url: "http://storage.test".to_string(),
        rabbitmq_url: "amqp://localhost:5672".to_string(),
        broker_pool_connections: 1,
        worker_callback_token: WORKER_TOKEN.to_string(),
        google_userinfo_url: "http://google.test/userinfo".to_string(),
        outbox: RelayConfig::default(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Storage service stand-in: every path has a thumbnail.
pub struct StubThumbnails;

#[async_trait]
impl ThumbnailSource for StubThumbnails {
    async fn thumbnail_url(&self, path: &str) -> Result<String, ThumbnailError> {
        Ok(format!("http://storage.test{path}"))
    }
}

/// Google stand-in keyed on [`GOOGLE_TOKEN_PREFIX`].
pub struct StubGoogle;

#[async_trait]
impl GoogleIdentity for StubGoogle {
    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, GoogleError> {
        let email = access_token
            .strip_prefix(GOOGLE_TOKEN_PREFIX)
            .ok_or(GoogleError::Rejected(401))?;
        Ok(GoogleUserInfo {
            email: email.to_string(),
            name: "Google User".to_string(),
            picture: "https://img.test/avatar.png".to_string(),
        })
    }
}

/// Build the full application router with all middleware layers, backed by
/// the given database pool and stubbed external services.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let lifecycle = AssetLifecycle::new(
        Arc::new(PgAssetStore::new(pool.clone())),
        Arc::new(StubThumbnails),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        lifecycle: Arc::new(lifecycle),
        google: Arc::new(StubGoogle),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request should build")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, empty_request("GET", uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request("GET", uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request("POST", uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request("POST", uri, Some(token), body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request("POST", uri, Some(token))).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request("PATCH", uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request("DELETE", uri, Some(token))).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Sign up through the API and return `(access_token, user_id)`.
pub async fn signup(app: Router, email: &str) -> (String, String) {
    let body = serde_json::json!({
        "name": "Test User",
        "email": email,
        "password": "password123",
    });
    let response = post_json(app, "/api/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["accessToken"].as_str().expect("accessToken").to_string(),
        json["user"]["id"].as_str().expect("user id").to_string(),
    )
}

/// Create an asset through the API and return its `data` object.
pub async fn create_asset(app: Router, token: &str, title: &str, is_private: bool) -> Value {
    create_asset_with_tags(app, token, title, is_private, &[]).await
}

pub async fn create_asset_with_tags(
    app: Router,
    token: &str,
    title: &str,
    is_private: bool,
    tags: &[&str],
) -> Value {
    let body = serde_json::json!({
        "title": title,
        "isPrivate": is_private,
        "photoDirUrl": "/files/uploads/scan-1",
        "type": "non_lidar",
        "tags": tags,
    });
    let response = post_json_auth(app, "/api/assets", body, token).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    body_json(response).await["data"].clone()
}
