//! HTTP router and middleware for the segment3d API.
//!
//! `main.rs` and the integration tests both go through [`build_app_router`].

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Request bodies are small JSON documents; uploads go to the storage service.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Browsers may cache a preflight answer this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(600);

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Mount every resource under `/api` and wrap it in the middleware stack.
///
/// Outermost first: CORS, request id assignment, tracing, request id echo,
/// timeout, panic recovery.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(CatchPanicLayer::new());

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware)
        // CORS is applied as a separate router layer (still outermost) so its
        // inner response body is axum's `Body`, which implements `Default`.
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the web viewer. Clients authenticate with bearer tokens, so
/// credentials (cookies) are not allowed.
///
/// Panics at startup if any configured origin is invalid.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(CORS_MAX_AGE)
}
