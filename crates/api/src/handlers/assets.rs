//! Handlers for the `/assets` resource.
//!
//! Writes that touch status, likes or the outbox go through
//! [`AssetLifecycle`](segment3d_pipeline::AssetLifecycle); read paths query
//! the repositories directly.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use segment3d_core::asset_status::{AssetStatus, PipelineStage};
use segment3d_core::asset_type::AssetType;
use segment3d_core::error::CoreError;
use segment3d_core::tag_filter::{matches_any, parse_filter};
use segment3d_core::types::{DbId, Timestamp};
use segment3d_db::models::asset::{Asset, AssetListing};
use segment3d_db::repositories::AssetRepo;
use segment3d_pipeline::{CreateAssetInput, SegmentationRequest};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{AppPath, AppQuery, ValidJson};
use crate::middleware::auth::{AuthUser, OptionalAuthUser, WorkerAuth};
use crate::query::AssetListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /assets`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    /// Required; a missing flag is rejected rather than defaulted.
    pub is_private: bool,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub photo_dir_url: String,
    pub pcl_url: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for the worker stage callbacks.
#[derive(Debug, Deserialize, Validate)]
pub struct StageReportRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub url: String,
}

/// Request body for `POST /assets/saga/segment/{id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    pub x: i32,
    pub y: i32,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub url: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub unique_identifier: String,
}

/// Response body for `POST /assets/saga/segment/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResponse {
    pub asset_id: DbId,
    pub unique_identifier: String,
    /// Storage path the segmented point cloud will be written to.
    pub path: String,
}

/// Owner summary embedded in [`AssetView`].
#[derive(Debug, Serialize)]
pub struct OwnerView {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub avatar: String,
}

/// Asset as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub thumbnail_url: String,
    pub photo_dir_url: String,
    pub pcl_url: Option<String>,
    pub pcl_colmap_url: Option<String>,
    pub splat_url: Option<String>,
    pub segmented_pcl_dir_url: Option<String>,
    pub segmented_splat_dir_url: Option<String>,
    pub is_private: bool,
    pub status: AssetStatus,
    pub likes: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Present on listing and detail responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OwnerView>,
    /// Present on listing and detail responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub is_liked_by_me: bool,
}

impl AssetView {
    fn from_asset(asset: Asset, is_liked_by_me: bool) -> Self {
        Self {
            id: asset.id,
            title: asset.title,
            slug: asset.slug,
            asset_type: asset.asset_type,
            thumbnail_url: asset.thumbnail_url,
            photo_dir_url: asset.photo_dir_url,
            pcl_url: asset.pcl_url,
            pcl_colmap_url: asset.pcl_colmap_url,
            splat_url: asset.splat_url,
            segmented_pcl_dir_url: asset.segmented_pcl_dir_url,
            segmented_splat_dir_url: asset.segmented_splat_dir_url,
            is_private: asset.is_private,
            status: asset.status,
            likes: asset.likes,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
            user: None,
            tags: None,
            is_liked_by_me,
        }
    }
}

impl From<AssetListing> for AssetView {
    fn from(listing: AssetListing) -> Self {
        let owner = OwnerView {
            id: listing.asset.user_id,
            email: listing.owner_email,
            name: listing.owner_name,
            avatar: listing.owner_avatar,
        };
        let mut view = AssetView::from_asset(listing.asset, listing.is_liked_by_me);
        view.user = Some(owner);
        view.tags = Some(listing.tag_names);
        view
    }
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

/// POST /api/assets
///
/// Register an uploaded capture and queue its reconstruction. Answers 202:
/// the asset exists but processing has only been scheduled.
pub async fn create_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateAssetRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AssetView>>)> {
    let asset_type = AssetType::from_str(&input.asset_type)?;

    let asset = state
        .lifecycle
        .create(CreateAssetInput {
            owner: auth.user_id,
            title: input.title,
            asset_type,
            is_private: input.is_private,
            photo_dir_url: input.photo_dir_url,
            pcl_url: input.pcl_url,
            tags: input.tags,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: AssetView::from_asset(asset, false),
        }),
    ))
}

/// GET /api/assets
///
/// Public assets, plus the caller's private ones when signed in.
pub async fn list_assets(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AssetListParams>,
) -> AppResult<Json<DataResponse<Vec<AssetView>>>> {
    let rows = AssetRepo::list_visible(&state.pool, viewer.user_id(), params.keyword.as_deref())
        .await?;
    Ok(Json(DataResponse {
        data: filter_by_tags(rows, params.filter.as_deref()),
    }))
}

/// GET /api/assets/me
pub async fn list_my_assets(
    auth: AuthUser,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AssetListParams>,
) -> AppResult<Json<DataResponse<Vec<AssetView>>>> {
    let rows = AssetRepo::list_owned(&state.pool, auth.user_id, params.keyword.as_deref()).await?;
    Ok(Json(DataResponse {
        data: filter_by_tags(rows, params.filter.as_deref()),
    }))
}

/// GET /api/assets/{slug}
pub async fn get_asset(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> AppResult<Json<DataResponse<AssetView>>> {
    let listing = AssetRepo::find_listing_by_slug(&state.pool, &slug, viewer.user_id())
        .await?
        .ok_or_else(|| CoreError::not_found("Asset", &slug))?;
    Ok(Json(DataResponse {
        data: AssetView::from(listing),
    }))
}

/// DELETE /api/assets/{id}
///
/// Owner only. Someone else's asset is reported as missing.
pub async fn remove_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<DataResponse<AssetView>>> {
    let asset = state.lifecycle.remove(auth.user_id, id).await?;
    Ok(Json(DataResponse {
        data: AssetView::from_asset(asset, false),
    }))
}

// ---------------------------------------------------------------------------
// Worker callbacks
// ---------------------------------------------------------------------------

/// PATCH /api/assets/{pointcloud|gaussian|ptv3|saga}/{id}
///
/// A worker reports one finished stage. Out-of-order reports still store
/// the URL and answer 200 with the status unchanged.
pub async fn report_stage(
    stage: PipelineStage,
    _worker: WorkerAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    ValidJson(input): ValidJson<StageReportRequest>,
) -> AppResult<Json<DataResponse<AssetView>>> {
    let write = state.lifecycle.record_stage_output(id, stage, &input.url).await?;
    Ok(Json(DataResponse {
        data: AssetView::from_asset(write.asset, false),
    }))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

/// POST /api/assets/like/{id}
pub async fn like_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<DataResponse<AssetView>>> {
    let asset = state.lifecycle.like(auth.user_id, id).await?;
    Ok(Json(DataResponse {
        data: AssetView::from_asset(asset, true),
    }))
}

/// POST /api/assets/unlike/{id}
pub async fn unlike_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<DataResponse<AssetView>>> {
    let asset = state.lifecycle.unlike(auth.user_id, id).await?;
    Ok(Json(DataResponse {
        data: AssetView::from_asset(asset, false),
    }))
}

// ---------------------------------------------------------------------------
// Interactive segmentation
// ---------------------------------------------------------------------------

/// POST /api/assets/saga/segment/{id}
///
/// Queue a SAGA segmentation around a clicked point.
pub async fn segment_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    ValidJson(input): ValidJson<SegmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SegmentResponse>>)> {
    let unique_identifier = input.unique_identifier.clone();
    let path = state
        .lifecycle
        .request_segmentation(
            auth.user_id,
            id,
            SegmentationRequest {
                x: input.x,
                y: input.y,
                url: input.url,
                unique_identifier: input.unique_identifier,
            },
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SegmentResponse {
                asset_id: id,
                unique_identifier,
                path,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn filter_by_tags(rows: Vec<AssetListing>, raw_filter: Option<&str>) -> Vec<AssetView> {
    let filter = parse_filter(raw_filter);
    rows.into_iter()
        .filter(|row| matches_any(&row.tag_names, &filter))
        .map(AssetView::from)
        .collect()
}
