//! Asset lifecycle orchestration.
//!
//! [`AssetLifecycle`] owns every write that moves an asset through its
//! processing pipeline. It depends only on the [`AssetStore`] and
//! [`ThumbnailSource`] seams, so it runs unchanged against Postgres in
//! production and against in-memory fakes in tests.

pub mod error;
pub mod lifecycle;
pub mod store;
pub mod thumbnail;

pub use error::PipelineError;
pub use lifecycle::{AssetLifecycle, CreateAssetInput, SegmentationRequest};
pub use store::{AdvancePlan, AssetStore, PgAssetStore, StageWrite};
pub use thumbnail::{HttpThumbnailSource, ThumbnailError, ThumbnailSource};
