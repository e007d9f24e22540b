use std::sync::Arc;

use segment3d_pipeline::AssetLifecycle;

use crate::auth::google::GoogleIdentity;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: segment3d_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Asset status machine and every write that touches it.
    pub lifecycle: Arc<AssetLifecycle>,
    /// Resolves Google OAuth access tokens to a profile.
    pub google: Arc<dyn GoogleIdentity>,
}
