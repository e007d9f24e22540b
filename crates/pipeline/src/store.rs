//! Persistence seam for the lifecycle manager.

use async_trait::async_trait;
use segment3d_core::asset_status::{AssetStatus, PipelineStage};
use segment3d_core::types::DbId;
use segment3d_db::models::asset::{Asset, NewAsset, StatusAdvance};
use segment3d_db::models::outbox::NewOutboxMessage;
use segment3d_db::repositories::{
    AssetRepo, LikeOutcome, LikeRepo, OutboxRepo, TagRepo, UnlikeOutcome,
};
use segment3d_db::DbPool;

use crate::error::PipelineError;

/// Decides, from the locked row, whether a stage report moves the status.
pub type AdvancePlan<'a> =
    &'a (dyn Fn(&Asset) -> Result<Option<StatusAdvance>, PipelineError> + Send + Sync);

/// Result of recording a stage output.
#[derive(Debug, Clone)]
pub struct StageWrite {
    /// The row after the write.
    pub asset: Asset,
    /// Status observed under the row lock, before any transition.
    pub previous_status: AssetStatus,
    pub advanced: bool,
}

/// Storage operations the lifecycle manager relies on. Every method is
/// atomic on its own.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Every slug beginning with `base`.
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, PipelineError>;

    /// Insert the asset, resolve and attach its tags, then apply `advance`
    /// (which enqueues its message). All or nothing.
    async fn create_asset(
        &self,
        asset: &NewAsset,
        tags: &[String],
        advance: &StatusAdvance,
    ) -> Result<Asset, PipelineError>;

    async fn find_asset(&self, id: DbId) -> Result<Option<Asset>, PipelineError>;

    /// Lock the asset, overwrite the stage URL, then apply whatever `plan`
    /// returns for the locked row. `None` when the asset does not exist.
    async fn record_stage_output(
        &self,
        id: DbId,
        stage: PipelineStage,
        url: &str,
        plan: AdvancePlan<'_>,
    ) -> Result<Option<StageWrite>, PipelineError>;

    /// Delete an asset owned by `owner`, returning the deleted row.
    async fn remove_asset(&self, owner: DbId, id: DbId) -> Result<Option<Asset>, PipelineError>;

    async fn like(&self, user: DbId, asset: DbId) -> Result<LikeOutcome, PipelineError>;

    async fn unlike(&self, user: DbId, asset: DbId) -> Result<UnlikeOutcome, PipelineError>;

    /// Enqueue a message that is not tied to a status change.
    async fn enqueue(&self, message: &NewOutboxMessage) -> Result<(), PipelineError>;
}

/// [`AssetStore`] over Postgres.
pub struct PgAssetStore {
    pool: DbPool,
}

impl PgAssetStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, PipelineError> {
        Ok(AssetRepo::slugs_with_prefix(&self.pool, base).await?)
    }

    async fn create_asset(
        &self,
        asset: &NewAsset,
        tags: &[String],
        advance: &StatusAdvance,
    ) -> Result<Asset, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let created = AssetRepo::insert_in(&mut tx, asset).await?;

        let resolved = TagRepo::resolve_in(&mut tx, tags).await?;
        let tag_ids: Vec<DbId> = resolved.iter().map(|t| t.id).collect();
        TagRepo::attach_in(&mut tx, created.id, &tag_ids).await?;

        let advanced = AssetRepo::advance_status_in(&mut tx, created.id, advance)
            .await?
            .unwrap_or(created);

        tx.commit().await?;
        Ok(advanced)
    }

    async fn find_asset(&self, id: DbId) -> Result<Option<Asset>, PipelineError> {
        Ok(AssetRepo::find_by_id(&self.pool, id).await?)
    }

    async fn record_stage_output(
        &self,
        id: DbId,
        stage: PipelineStage,
        url: &str,
        plan: AdvancePlan<'_>,
    ) -> Result<Option<StageWrite>, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = AssetRepo::lock_in(&mut tx, id).await? else {
            return Ok(None);
        };

        let written = AssetRepo::set_stage_output_in(&mut tx, id, stage, url).await?;

        let (asset, advanced) = match plan(&current)? {
            Some(advance) => match AssetRepo::advance_status_in(&mut tx, id, &advance).await? {
                Some(moved) => (moved, true),
                None => (written, false),
            },
            None => (written, false),
        };

        tx.commit().await?;
        Ok(Some(StageWrite {
            asset,
            previous_status: current.status,
            advanced,
        }))
    }

    async fn remove_asset(&self, owner: DbId, id: DbId) -> Result<Option<Asset>, PipelineError> {
        Ok(AssetRepo::delete_owned(&self.pool, owner, id).await?)
    }

    async fn like(&self, user: DbId, asset: DbId) -> Result<LikeOutcome, PipelineError> {
        Ok(LikeRepo::like(&self.pool, user, asset).await?)
    }

    async fn unlike(&self, user: DbId, asset: DbId) -> Result<UnlikeOutcome, PipelineError> {
        Ok(LikeRepo::unlike(&self.pool, user, asset).await?)
    }

    async fn enqueue(&self, message: &NewOutboxMessage) -> Result<(), PipelineError> {
        OutboxRepo::insert(&self.pool, message).await?;
        Ok(())
    }
}
