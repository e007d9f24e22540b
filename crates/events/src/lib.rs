//! Outbound pipeline events.
//!
//! - [`messages`] -- queue names and payload contracts shared with workers.
//! - [`publisher`] -- the [`EventPublisher`] seam and its broker implementation.
//! - [`relay`] -- the [`OutboxRelay`] background task that drains
//!   `outbox_messages` into the broker.

pub mod messages;
pub mod publisher;
pub mod relay;

pub use messages::{GenerateColmapEvent, OutboundEvent, SegmentationRequestedEvent, StatusChangedEvent};
pub use publisher::{BrokerPublisher, EventPublisher, PublishError};
pub use relay::{DrainReport, OutboxRelay, OutboxStore, PgOutboxStore, RelayConfig};
