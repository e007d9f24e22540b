//! Asset entity, listing row, and DTOs.

use segment3d_core::asset_status::AssetStatus;
use segment3d_core::asset_type::AssetType;
use segment3d_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::outbox::NewOutboxMessage;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub slug: String,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub thumbnail_url: String,
    pub photo_dir_url: String,
    pub pcl_url: Option<String>,
    pub pcl_colmap_url: Option<String>,
    pub splat_url: Option<String>,
    pub segmented_pcl_dir_url: Option<String>,
    pub segmented_splat_dir_url: Option<String>,
    pub is_private: bool,
    #[sqlx(try_from = "String")]
    pub status: AssetStatus,
    pub likes: i32,
    /// Bumped on every status transition.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An asset joined with its owner, tag names, and the viewer's like.
#[derive(Debug, Clone, FromRow)]
pub struct AssetListing {
    #[sqlx(flatten)]
    pub asset: Asset,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_avatar: String,
    pub tag_names: Vec<String>,
    /// Always `false` for anonymous viewers.
    pub is_liked_by_me: bool,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Insert payload for a new asset. Status always starts at `created`.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub slug: String,
    pub asset_type: AssetType,
    pub thumbnail_url: String,
    pub photo_dir_url: String,
    pub pcl_url: Option<String>,
    pub is_private: bool,
}

/// A status move together with the event that must be relayed for it.
#[derive(Debug, Clone)]
pub struct StatusAdvance {
    pub from: AssetStatus,
    pub to: AssetStatus,
    pub message: NewOutboxMessage,
}
