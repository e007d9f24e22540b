pub mod assets;
pub mod auth;
pub mod health;
pub mod tags;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                  service + database health (public)
///
/// /auth/signup                             register (public)
/// /auth/signin                             sign in (public)
/// /auth/google                             Google sign-in (public)
///
/// /users                                   get, update own profile
/// /users/password                          change own password
///
/// /assets                                  list (optional auth), create
/// /assets/me                               own assets
/// /assets/{slug}                           detail (optional auth)
/// /assets/{id}                             delete (owner)
/// /assets/{pointcloud|gaussian|ptv3|saga}/{id}
///                                          stage callbacks (worker token)
/// /assets/like/{id}                        like
/// /assets/unlike/{id}                      unlike
/// /assets/saga/segment/{id}                queue interactive segmentation
///
/// /tags/search                             tag lookup (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/assets", assets::router())
        .nest("/tags", tags::router())
}
