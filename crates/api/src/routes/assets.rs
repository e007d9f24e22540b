//! Route definitions for the `/assets` resource.

use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::Router;
use segment3d_core::asset_status::PipelineStage;
use segment3d_core::types::DbId;

use crate::extract::{AppPath, ValidJson};
use crate::handlers::assets::{self, StageReportRequest};
use crate::middleware::auth::WorkerAuth;
use crate::state::AppState;

/// Routes mounted at `/assets`.
///
/// ```text
/// GET    /                        -> list_assets (optional auth)
/// POST   /                        -> create_asset
/// GET    /me                      -> list_my_assets
/// GET    /{slug}                  -> get_asset (optional auth)
/// DELETE /{id}                    -> remove_asset (owner only)
/// PATCH  /pointcloud/{id}         -> report_stage (worker token)
/// PATCH  /gaussian/{id}           -> report_stage (worker token)
/// PATCH  /ptv3/{id}               -> report_stage (worker token)
/// PATCH  /saga/{id}               -> report_stage (worker token)
/// POST   /like/{id}               -> like_asset
/// POST   /unlike/{id}             -> unlike_asset
/// POST   /saga/segment/{id}       -> segment_asset
/// ```
pub fn router() -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(assets::list_assets).post(assets::create_asset))
        .route("/me", get(assets::list_my_assets))
        // `{id}` shares the segment with `{slug}`; the handlers parse it.
        .route(
            "/{id}",
            get(assets::get_asset).delete(assets::remove_asset),
        )
        .route("/like/{id}", post(assets::like_asset))
        .route("/unlike/{id}", post(assets::unlike_asset))
        .route("/saga/segment/{id}", post(assets::segment_asset));

    for stage in PipelineStage::ALL {
        let path = format!("/{}/{{id}}", stage.route_segment());
        router = router.route(
            &path,
            patch(
                move |worker: WorkerAuth,
                      state: State<AppState>,
                      id: AppPath<DbId>,
                      body: ValidJson<StageReportRequest>| {
                    assets::report_stage(stage, worker, state, id, body)
                },
            ),
        );
    }

    router
}
