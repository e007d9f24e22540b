use segment3d_core::error::CoreError;

use crate::thumbnail::ThumbnailError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Thumbnail fetch failed: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
