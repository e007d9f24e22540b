//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Methods suffixed `_in` run inside a
//! caller-owned transaction so several writes can commit together.

pub mod asset_repo;
pub mod like_repo;
pub mod outbox_repo;
pub mod tag_repo;
pub mod user_repo;

pub use asset_repo::AssetRepo;
pub use like_repo::{LikeOutcome, LikeRepo, UnlikeOutcome};
pub use outbox_repo::OutboxRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
