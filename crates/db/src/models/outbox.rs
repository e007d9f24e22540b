//! Transactional outbox rows.

use segment3d_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `outbox_messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct OutboxMessage {
    pub id: i64,
    pub queue: String,
    pub asset_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub published_at: Option<Timestamp>,
}

/// A message to enqueue alongside the change that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxMessage {
    pub queue: String,
    pub asset_id: Option<DbId>,
    pub payload: serde_json::Value,
}
