//! Message contracts for the external processing workers.
//!
//! Field names are snake_case on the wire; workers deserialize them as-is.

use segment3d_core::asset_status::AssetStatus;
use segment3d_core::asset_type::AssetType;
use segment3d_core::types::DbId;
use segment3d_db::models::outbox::NewOutboxMessage;
use serde::{Deserialize, Serialize};

/// Colmap / splat / segmentation jobs for new assets.
pub const PROCESS_QUEUE: &str = "process";

/// Interactive SAGA segmentation requests.
pub const QUERY_QUEUE: &str = "query";

/// Status transition notifications.
pub const STATUS_QUEUE: &str = "asset_status";

/// A payload bound to one queue.
pub trait OutboundEvent: Serialize {
    const QUEUE: &'static str;

    fn asset_id(&self) -> DbId;

    /// Wrap the payload as an outbox row.
    fn to_outbox(&self) -> Result<NewOutboxMessage, serde_json::Error> {
        Ok(NewOutboxMessage {
            queue: Self::QUEUE.to_string(),
            asset_id: Some(self.asset_id()),
            payload: serde_json::to_value(self)?,
        })
    }
}

/// Start the reconstruction pipeline for a freshly uploaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateColmapEvent {
    pub asset_id: DbId,
    pub photo_dir_url: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Lidar captures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_cloud_url: Option<String>,
}

impl OutboundEvent for GenerateColmapEvent {
    const QUEUE: &'static str = PROCESS_QUEUE;

    fn asset_id(&self) -> DbId {
        self.asset_id
    }
}

/// Segment the splat around a clicked pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationRequestedEvent {
    pub asset_id: DbId,
    pub x: i32,
    pub y: i32,
    pub unique_identifier: String,
    pub url: String,
}

impl OutboundEvent for SegmentationRequestedEvent {
    const QUEUE: &'static str = QUERY_QUEUE;

    fn asset_id(&self) -> DbId {
        self.asset_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub asset_id: DbId,
    pub previous_status: AssetStatus,
    pub status: AssetStatus,
    /// Asset version after the transition.
    pub version: i64,
}

impl OutboundEvent for StatusChangedEvent {
    const QUEUE: &'static str = STATUS_QUEUE;

    fn asset_id(&self) -> DbId {
        self.asset_id
    }
}
