//! Route definitions for the `/users` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. All require auth and act on the caller.
///
/// ```text
/// GET    /            -> get_me
/// PATCH  /            -> update_me
/// PATCH  /password    -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::get_me).patch(users::update_me))
        .route("/password", patch(users::change_password))
}
