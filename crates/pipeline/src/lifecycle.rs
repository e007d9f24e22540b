//! The asset lifecycle manager.

use std::sync::Arc;

use segment3d_core::asset_status::{next_status, AssetStatus, LifecycleEvent, PipelineStage};
use segment3d_core::asset_type::AssetType;
use segment3d_core::error::CoreError;
use segment3d_core::slug::{base_slug, next_slug};
use segment3d_core::storage::{segmentation_output_path, thumbnail_path, validate_unique_identifier};
use segment3d_core::types::DbId;
use segment3d_db::models::asset::{Asset, NewAsset, StatusAdvance};
use segment3d_db::repositories::asset_repo::SLUG_CONSTRAINT;
use segment3d_db::repositories::{LikeOutcome, UnlikeOutcome};
use segment3d_events::messages::{
    GenerateColmapEvent, OutboundEvent, SegmentationRequestedEvent, StatusChangedEvent,
};

use crate::error::PipelineError;
use crate::store::{AssetStore, StageWrite};
use crate::thumbnail::ThumbnailSource;

/// Concurrent creates may race for the same slug; retry this many times.
const SLUG_ATTEMPTS: usize = 3;

/// Validated input for a new asset.
#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    pub owner: DbId,
    pub title: String,
    pub asset_type: AssetType,
    pub is_private: bool,
    pub photo_dir_url: String,
    pub pcl_url: Option<String>,
    pub tags: Vec<String>,
}

/// A click on the splat viewer asking SAGA to segment around it.
#[derive(Debug, Clone)]
pub struct SegmentationRequest {
    pub x: i32,
    pub y: i32,
    pub url: String,
    pub unique_identifier: String,
}

/// Owns the asset status state machine and every write that touches it.
pub struct AssetLifecycle {
    store: Arc<dyn AssetStore>,
    thumbnails: Arc<dyn ThumbnailSource>,
}

impl AssetLifecycle {
    pub fn new(store: Arc<dyn AssetStore>, thumbnails: Arc<dyn ThumbnailSource>) -> Self {
        Self { store, thumbnails }
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create an asset and queue its colmap job.
    ///
    /// The asset is inserted as `created` and moved to
    /// `generating sparse point cloud` in the same transaction that enqueues
    /// the `process` event. A thumbnail failure aborts before anything is
    /// written.
    pub async fn create(&self, input: CreateAssetInput) -> Result<Asset, PipelineError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(CoreError::Validation("title must not be empty".into()).into());
        }
        let photo_dir_url = input.photo_dir_url.trim().to_string();
        if photo_dir_url.is_empty() {
            return Err(CoreError::Validation("photoDirUrl must not be empty".into()).into());
        }
        let pcl_url = input
            .pcl_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let tags = normalize_tags(&input.tags);

        let path = thumbnail_path(&photo_dir_url)?;
        let thumbnail_url = self.thumbnails.thumbnail_url(&path).await?;

        let base = base_slug(&title);
        let to = next_status(AssetStatus::Created, LifecycleEvent::ColmapQueued).ok_or_else(
            || CoreError::Internal("no transition out of 'created'".into()),
        )?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let existing = self.store.slugs_with_prefix(&base).await?;
            let slug = next_slug(&base, &existing);

            let new_asset = NewAsset {
                id: uuid::Uuid::now_v7(),
                user_id: input.owner,
                title: title.clone(),
                slug,
                asset_type: input.asset_type,
                thumbnail_url: thumbnail_url.clone(),
                photo_dir_url: photo_dir_url.clone(),
                pcl_url: pcl_url.clone(),
                is_private: input.is_private,
            };
            let event = GenerateColmapEvent {
                asset_id: new_asset.id,
                photo_dir_url: new_asset.photo_dir_url.clone(),
                asset_type: new_asset.asset_type,
                point_cloud_url: new_asset.pcl_url.clone(),
            };
            let advance = StatusAdvance {
                from: AssetStatus::Created,
                to,
                message: event.to_outbox()?,
            };

            match self.store.create_asset(&new_asset, &tags, &advance).await {
                Ok(asset) => {
                    tracing::info!(
                        asset_id = %asset.id,
                        user_id = %input.owner,
                        slug = %asset.slug,
                        status = %asset.status,
                        tags = tags.len(),
                        "Asset created, colmap job queued"
                    );
                    return Ok(asset);
                }
                Err(PipelineError::Database(ref e))
                    if attempt < SLUG_ATTEMPTS
                        && segment3d_db::is_unique_violation(e, SLUG_CONSTRAINT) =>
                {
                    tracing::debug!(attempt, base = %base, "Slug taken concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage callbacks
    // -----------------------------------------------------------------------

    /// Record a worker's stage output.
    ///
    /// The URL is always written. The status only advances when the asset is
    /// in the stage's expected predecessor status; otherwise the report is
    /// logged as out of order and the status is left alone.
    pub async fn record_stage_output(
        &self,
        id: DbId,
        stage: PipelineStage,
        url: &str,
    ) -> Result<StageWrite, PipelineError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CoreError::Validation("url must not be empty".into()).into());
        }

        let plan = move |current: &Asset| -> Result<Option<StatusAdvance>, PipelineError> {
            let Some(to) = next_status(current.status, LifecycleEvent::StageCompleted(stage))
            else {
                return Ok(None);
            };
            let event = StatusChangedEvent {
                asset_id: current.id,
                previous_status: current.status,
                status: to,
                version: current.version + 1,
            };
            Ok(Some(StatusAdvance {
                from: current.status,
                to,
                message: event.to_outbox()?,
            }))
        };

        let write = self
            .store
            .record_stage_output(id, stage, url, &plan)
            .await?
            .ok_or_else(|| CoreError::not_found("Asset", id))?;

        if write.advanced {
            tracing::info!(
                asset_id = %id,
                stage = %stage,
                from = %write.previous_status,
                to = %write.asset.status,
                "Asset status advanced"
            );
        } else {
            tracing::warn!(
                asset_id = %id,
                stage = %stage,
                current = %write.previous_status,
                expected = %stage.expected_status(),
                "Out-of-order stage report; output saved, status unchanged"
            );
        }
        Ok(write)
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    /// Delete an owned asset. Missing and not-owned are both `NotFound`.
    pub async fn remove(&self, owner: DbId, id: DbId) -> Result<Asset, PipelineError> {
        let removed = self
            .store
            .remove_asset(owner, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Asset", id))?;
        tracing::info!(asset_id = %id, user_id = %owner, "Asset removed");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    pub async fn like(&self, user: DbId, id: DbId) -> Result<Asset, PipelineError> {
        match self.store.like(user, id).await? {
            LikeOutcome::Liked(asset) => {
                tracing::info!(asset_id = %id, user_id = %user, likes = asset.likes, "Asset liked");
                Ok(asset)
            }
            LikeOutcome::AlreadyLiked => {
                Err(CoreError::Conflict(format!("Asset {id} is already liked")).into())
            }
            LikeOutcome::AssetMissing => Err(CoreError::not_found("Asset", id).into()),
        }
    }

    pub async fn unlike(&self, user: DbId, id: DbId) -> Result<Asset, PipelineError> {
        match self.store.unlike(user, id).await? {
            UnlikeOutcome::Unliked(asset) => {
                tracing::info!(asset_id = %id, user_id = %user, likes = asset.likes, "Asset unliked");
                Ok(asset)
            }
            UnlikeOutcome::NotLiked => Err(CoreError::not_found("Like", id).into()),
        }
    }

    // -----------------------------------------------------------------------
    // Interactive segmentation
    // -----------------------------------------------------------------------

    /// Queue a SAGA segmentation around a clicked point. Returns the storage
    /// path the result will be written to.
    pub async fn request_segmentation(
        &self,
        requester: DbId,
        id: DbId,
        request: SegmentationRequest,
    ) -> Result<String, PipelineError> {
        validate_unique_identifier(&request.unique_identifier)?;
        if request.url.trim().is_empty() {
            return Err(CoreError::Validation("url must not be empty".into()).into());
        }

        let asset = self
            .store
            .find_asset(id)
            .await?
            .filter(|a| !a.is_private || a.user_id == requester)
            .ok_or_else(|| CoreError::not_found("Asset", id))?;

        let event = SegmentationRequestedEvent {
            asset_id: asset.id,
            x: request.x,
            y: request.y,
            unique_identifier: request.unique_identifier.clone(),
            url: request.url,
        };
        self.store.enqueue(&event.to_outbox()?).await?;

        tracing::info!(
            asset_id = %id,
            user_id = %requester,
            unique_identifier = %request.unique_identifier,
            "Segmentation requested"
        );
        Ok(segmentation_output_path(asset.id, &request.unique_identifier))
    }
}

/// Trim, drop empties, and de-duplicate while keeping first-seen order.
fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let raw = vec![
            " indoor ".to_string(),
            "chair".to_string(),
            "".to_string(),
            "indoor".to_string(),
            "Indoor".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), ["indoor", "chair", "Indoor"]);
    }
}
