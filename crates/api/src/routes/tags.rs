//! Route definitions for the `/tags` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET /search   -> search_tags (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(tags::search_tags))
}
