//! Transactional outbox relay.
//!
//! Asset changes write their events into `outbox_messages` in the same
//! transaction as the change. [`OutboxRelay`] runs as a background task,
//! forwarding pending rows to the broker in insertion order and stamping them
//! published. Delivery is at-least-once: a crash between publish and
//! `mark_published` republishes the row on the next tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use segment3d_db::models::outbox::OutboxMessage;
use segment3d_db::repositories::OutboxRepo;
use segment3d_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::publisher::EventPublisher;

/// Default relay poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of rows drained per tick.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

// ---------------------------------------------------------------------------
// OutboxStore
// ---------------------------------------------------------------------------

/// Storage side of the relay.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, sqlx::Error>;

    async fn mark_published(&self, id: i64) -> Result<(), sqlx::Error>;

    async fn record_failure(&self, id: i64, error: &str) -> Result<(), sqlx::Error>;
}

/// [`OutboxStore`] over the `outbox_messages` table.
pub struct PgOutboxStore {
    pool: DbPool,
}

impl PgOutboxStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        OutboxRepo::fetch_pending(&self.pool, limit).await
    }

    async fn mark_published(&self, id: i64) -> Result<(), sqlx::Error> {
        OutboxRepo::mark_published(&self.pool, id).await?;
        Ok(())
    }

    async fn record_failure(&self, id: i64, error: &str) -> Result<(), sqlx::Error> {
        OutboxRepo::record_failure(&self.pool, id, error).await
    }
}

// ---------------------------------------------------------------------------
// OutboxRelay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RelayConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of a single drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub published: usize,
    /// `true` when the pass stopped early on a publish failure.
    pub stalled: bool,
}

/// Background service forwarding outbox rows to the broker.
pub struct OutboxRelay {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    config: RelayConfig,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// Run the relay loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox relay cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.drain_once().await {
                        tracing::error!(error = %e, "Failed to drain outbox");
                    }
                }
            }
        }
    }

    /// Publish one batch of pending rows.
    ///
    /// Stops at the first failed publish so later events never overtake an
    /// earlier one; the failed row is retried on the next pass.
    pub async fn drain_once(&self) -> Result<DrainReport, sqlx::Error> {
        let pending = self.store.fetch_pending(self.config.batch_size).await?;
        let mut report = DrainReport::default();

        for message in &pending {
            match self.publisher.publish(&message.queue, &message.payload).await {
                Ok(()) => {
                    self.store.mark_published(message.id).await?;
                    report.published += 1;
                    tracing::debug!(
                        outbox_id = message.id,
                        queue = %message.queue,
                        asset_id = ?message.asset_id,
                        "Outbox message published"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        outbox_id = message.id,
                        queue = %message.queue,
                        attempts = message.attempts + 1,
                        error = %e,
                        "Outbox publish failed, will retry"
                    );
                    self.store.record_failure(message.id, &e.to_string()).await?;
                    report.stalled = true;
                    break;
                }
            }
        }

        if report.published > 0 {
            tracing::info!(count = report.published, "Relayed outbox messages");
        }
        Ok(report)
    }
}
