//! Message broker publishing.

use std::time::Duration;

use async_trait::async_trait;
use broccoli_queue::error::BroccoliError;
use broccoli_queue::queue::BroccoliQueue;

/// Every publish must finish within this deadline.
pub const PUBLISH_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
}

impl From<BroccoliError> for PublishError {
    fn from(e: BroccoliError) -> Self {
        PublishError::Broker(e.to_string())
    }
}

/// Hands a JSON payload to a named queue.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, queue: &str, payload: &serde_json::Value) -> Result<(), PublishError>;
}

/// [`EventPublisher`] backed by a RabbitMQ connection pool.
///
/// Queues are declared durable on first use by the broker client.
pub struct BrokerPublisher {
    queue: BroccoliQueue,
    deadline: Duration,
}

impl BrokerPublisher {
    /// Connect to the broker at `url`.
    pub async fn connect(url: &str, pool_connections: u8) -> Result<Self, PublishError> {
        let queue = BroccoliQueue::builder(url)
            .pool_connections(pool_connections)
            .build()
            .await?;
        Ok(Self {
            queue,
            deadline: PUBLISH_DEADLINE,
        })
    }
}

#[async_trait]
impl EventPublisher for BrokerPublisher {
    async fn publish(&self, queue: &str, payload: &serde_json::Value) -> Result<(), PublishError> {
        let publish = self.queue.publish(queue, None, payload, None);
        match tokio::time::timeout(self.deadline, publish).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(PublishError::Timeout(self.deadline)),
        }
    }
}
