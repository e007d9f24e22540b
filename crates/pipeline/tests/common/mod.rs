//! In-memory fakes for the lifecycle seams.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use segment3d_core::asset_status::{AssetStatus, PipelineStage};
use segment3d_core::types::DbId;
use segment3d_db::models::asset::{Asset, NewAsset, StatusAdvance};
use segment3d_db::models::outbox::{NewOutboxMessage, OutboxMessage};
use segment3d_db::repositories::{LikeOutcome, UnlikeOutcome};
use segment3d_events::{EventPublisher, OutboxStore, PublishError};
use segment3d_pipeline::{
    AdvancePlan, AssetLifecycle, AssetStore, PipelineError, StageWrite, ThumbnailError,
    ThumbnailSource,
};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    assets: Vec<Asset>,
    tags: Vec<(DbId, String)>,
    likes: Vec<(DbId, DbId)>,
    outbox: Vec<OutboxMessage>,
}

/// Mirrors the transactional behaviour of the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn asset(&self, id: DbId) -> Option<Asset> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn asset_count(&self) -> usize {
        self.state.lock().unwrap().assets.len()
    }

    pub fn tags_of(&self, id: DbId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tags
            .iter()
            .filter(|(asset, _)| *asset == id)
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn outbox(&self) -> Vec<OutboxMessage> {
        self.state.lock().unwrap().outbox.clone()
    }

    pub fn outbox_on(&self, queue: &str) -> Vec<OutboxMessage> {
        self.outbox().into_iter().filter(|m| m.queue == queue).collect()
    }

    /// Force a status, bypassing the lifecycle.
    pub fn set_status(&self, id: DbId, status: AssetStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(asset) = state.assets.iter_mut().find(|a| a.id == id) {
            asset.status = status;
        }
    }

    fn push_outbox(state: &mut State, message: &NewOutboxMessage) {
        let id = state.outbox.len() as i64 + 1;
        state.outbox.push(OutboxMessage {
            id,
            queue: message.queue.clone(),
            asset_id: message.asset_id,
            payload: message.payload.clone(),
            attempts: 0,
            last_error: None,
            created_at: chrono::Utc::now(),
            published_at: None,
        });
    }

    fn apply_advance(state: &mut State, id: DbId, advance: &StatusAdvance) -> Option<Asset> {
        let asset = state.assets.iter_mut().find(|a| a.id == id)?;
        if asset.status != advance.from {
            return None;
        }
        asset.status = advance.to;
        asset.version += 1;
        let moved = asset.clone();
        Self::push_outbox(state, &advance.message);
        Some(moved)
    }
}

fn stage_slot(asset: &mut Asset, stage: PipelineStage) -> &mut Option<String> {
    match stage {
        PipelineStage::SparsePointCloud => &mut asset.pcl_colmap_url,
        PipelineStage::GaussianSplat => &mut asset.splat_url,
        PipelineStage::Ptv3Segmentation => &mut asset.segmented_pcl_dir_url,
        PipelineStage::SagaSegmentation => &mut asset.segmented_splat_dir_url,
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, PipelineError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assets
            .iter()
            .filter(|a| a.slug.starts_with(base))
            .map(|a| a.slug.clone())
            .collect())
    }

    async fn create_asset(
        &self,
        input: &NewAsset,
        tags: &[String],
        advance: &StatusAdvance,
    ) -> Result<Asset, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let now = chrono::Utc::now();
        state.assets.push(Asset {
            id: input.id,
            user_id: input.user_id,
            title: input.title.clone(),
            slug: input.slug.clone(),
            asset_type: input.asset_type,
            thumbnail_url: input.thumbnail_url.clone(),
            photo_dir_url: input.photo_dir_url.clone(),
            pcl_url: input.pcl_url.clone(),
            pcl_colmap_url: None,
            splat_url: None,
            segmented_pcl_dir_url: None,
            segmented_splat_dir_url: None,
            is_private: input.is_private,
            status: AssetStatus::Created,
            likes: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        });
        for name in tags {
            state.tags.push((input.id, name.clone()));
        }
        let moved = Self::apply_advance(&mut state, input.id, advance);
        Ok(moved.unwrap_or_else(|| state.assets.last().cloned().unwrap()))
    }

    async fn find_asset(&self, id: DbId) -> Result<Option<Asset>, PipelineError> {
        Ok(self.asset(id))
    }

    async fn record_stage_output(
        &self,
        id: DbId,
        stage: PipelineStage,
        url: &str,
        plan: AdvancePlan<'_>,
    ) -> Result<Option<StageWrite>, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let Some(asset) = state.assets.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        let current = asset.clone();
        *stage_slot(asset, stage) = Some(url.to_string());
        let written = asset.clone();

        let (asset, advanced) = match plan(&current)? {
            Some(advance) => match Self::apply_advance(&mut state, id, &advance) {
                Some(moved) => (moved, true),
                None => (written, false),
            },
            None => (written, false),
        };
        Ok(Some(StageWrite {
            asset,
            previous_status: current.status,
            advanced,
        }))
    }

    async fn remove_asset(&self, owner: DbId, id: DbId) -> Result<Option<Asset>, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let Some(pos) = state
            .assets
            .iter()
            .position(|a| a.id == id && a.user_id == owner)
        else {
            return Ok(None);
        };
        Ok(Some(state.assets.remove(pos)))
    }

    async fn like(&self, user: DbId, id: DbId) -> Result<LikeOutcome, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let visible = state
            .assets
            .iter()
            .any(|a| a.id == id && (!a.is_private || a.user_id == user));
        if !visible {
            return Ok(LikeOutcome::AssetMissing);
        }
        if state.likes.contains(&(user, id)) {
            return Ok(LikeOutcome::AlreadyLiked);
        }
        state.likes.push((user, id));
        let asset = state.assets.iter_mut().find(|a| a.id == id).unwrap();
        asset.likes += 1;
        Ok(LikeOutcome::Liked(asset.clone()))
    }

    async fn unlike(&self, user: DbId, id: DbId) -> Result<UnlikeOutcome, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let Some(pos) = state.likes.iter().position(|l| *l == (user, id)) else {
            return Ok(UnlikeOutcome::NotLiked);
        };
        state.likes.remove(pos);
        let asset = state.assets.iter_mut().find(|a| a.id == id).unwrap();
        asset.likes = (asset.likes - 1).max(0);
        Ok(UnlikeOutcome::Unliked(asset.clone()))
    }

    async fn enqueue(&self, message: &NewOutboxMessage) -> Result<(), PipelineError> {
        Self::push_outbox(&mut self.state.lock().unwrap(), message);
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        Ok(self
            .outbox()
            .into_iter()
            .filter(|m| m.published_at.is_none())
            .take(limit as usize)
            .collect())
    }

    async fn mark_published(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(m) = state.outbox.iter_mut().find(|m| m.id == id) {
            m.published_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(m) = state.outbox.iter_mut().find(|m| m.id == id) {
            m.attempts += 1;
            m.last_error = Some(error.to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Thumbnails and broker
// ---------------------------------------------------------------------------

/// Answers every path with `{base}{path}.png`, or fails when `fail` is set.
pub struct StubThumbnails {
    pub fail: bool,
    pub requested: Mutex<Vec<String>>,
}

impl StubThumbnails {
    pub fn ok() -> Self {
        Self {
            fail: false,
            requested: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requested: Mutex::default(),
        }
    }
}

#[async_trait]
impl ThumbnailSource for StubThumbnails {
    async fn thumbnail_url(&self, path: &str) -> Result<String, ThumbnailError> {
        self.requested.lock().unwrap().push(path.to_string());
        if self.fail {
            return Err(ThumbnailError::NotJson("text/html".to_string()));
        }
        Ok(format!("https://storage.test{path}.png"))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<(String, serde_json::Value)>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, queue: &str, payload: &serde_json::Value) -> Result<(), PublishError> {
        self.sent
            .lock()
            .unwrap()
            .push((queue.to_string(), payload.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub thumbnails: Arc<StubThumbnails>,
    pub lifecycle: AssetLifecycle,
}

pub fn harness() -> Harness {
    harness_with(StubThumbnails::ok())
}

pub fn harness_with(thumbnails: StubThumbnails) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let thumbnails = Arc::new(thumbnails);
    let lifecycle = AssetLifecycle::new(store.clone(), thumbnails.clone());
    Harness {
        store,
        thumbnails,
        lifecycle,
    }
}
