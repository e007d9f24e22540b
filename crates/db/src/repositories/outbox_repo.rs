//! Repository for the `outbox_messages` table.

use sqlx::PgPool;

use crate::models::outbox::{NewOutboxMessage, OutboxMessage};

const COLUMNS: &str = "id, queue, asset_id, payload, attempts, last_error, created_at, published_at";

/// Longest error text kept in `last_error`.
const MAX_ERROR_LEN: usize = 1000;

/// Provides enqueue and relay bookkeeping for outbound messages.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Enqueue a message inside the caller's transaction. Returns its id.
    pub async fn insert_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        message: &NewOutboxMessage,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO outbox_messages (queue, asset_id, payload) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(&message.queue)
        .bind(message.asset_id)
        .bind(&message.payload)
        .fetch_one(&mut **tx)
        .await
    }

    /// Enqueue a message on its own.
    pub async fn insert(pool: &PgPool, message: &NewOutboxMessage) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id = Self::insert_in(&mut tx, message).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Oldest unpublished messages, in insertion order.
    pub async fn fetch_pending(pool: &PgPool, limit: i64) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM outbox_messages \
             WHERE published_at IS NULL \
             ORDER BY id \
             LIMIT $1"
        );
        sqlx::query_as::<_, OutboxMessage>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of messages still waiting for the relay.
    pub async fn pending_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM outbox_messages WHERE published_at IS NULL")
            .fetch_one(pool)
            .await
    }

    /// Stamp a message as handed to the broker.
    pub async fn mark_published(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outbox_messages SET published_at = NOW(), attempts = attempts + 1 \
             WHERE id = $1 AND published_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failed publish attempt.
    pub async fn record_failure(pool: &PgPool, id: i64, error: &str) -> Result<(), sqlx::Error> {
        let error: String = error.chars().take(MAX_ERROR_LEN).collect();
        sqlx::query(
            "UPDATE outbox_messages SET attempts = attempts + 1, last_error = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
