use axum::extract::State;
use axum::{routing::get, Json, Router};
use segment3d_db::repositories::OutboxRepo;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub db_healthy: bool,
    /// Outbox rows not yet handed to the broker. A growing number means the
    /// relay is stalled. `None` when the database is down.
    pub outbox_pending: Option<i64>,
}

/// GET /api/health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = segment3d_db::health_check(&state.pool).await.is_ok();
    let outbox_pending = if db_healthy {
        OutboxRepo::pending_count(&state.pool).await.ok()
    } else {
        None
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        outbox_pending,
    })
}

/// Routes mounted alongside the resources under `/api`.
///
/// ```text
/// GET /health   -> health_check (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
