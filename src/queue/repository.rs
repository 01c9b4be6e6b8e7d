use std::sync::Arc;

use async_trait::async_trait;
use rabbitmq::{Message, MessageHandler, RabbitMQClient, RabbitMQError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::EventQueue;

/// Façade over the [`RabbitMQClient`] used by the rest of the crate
///
/// Client failures are passed through unchanged. Once [`QueueRepository::close`]
/// ran, every operation is logged and skipped. Through [`EventQueue`] a skipped
/// publish is reported as [`RabbitMQError::ClientStopped`] so callers never
/// count it as sent.
pub struct QueueRepository {
    client: Arc<RabbitMQClient>,
    closed: Mutex<bool>,
}

impl QueueRepository {
    pub fn new(client: Arc<RabbitMQClient>) -> Self {
        Self {
            client,
            closed: Mutex::new(false),
        }
    }

    pub fn client(&self) -> &Arc<RabbitMQClient> {
        &self.client
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }

    async fn skip_if_closed(&self, operation: &str, queue: &str) -> bool {
        let closed = *self.closed.lock().await;
        if closed {
            warn!(operation, queue, "queue repository is shutting down, ignoring operation");
        }
        closed
    }

    pub async fn publish(&self, queue: &str, message: Message) -> Result<(), RabbitMQError> {
        if self.skip_if_closed("publish", queue).await {
            return Ok(());
        }
        self.client.publish(queue, message).await
    }

    /// Consumes `queue` until the client is stopped
    pub async fn consume(
        &self,
        queue: &str,
        handler: &dyn MessageHandler,
        auto_ack: bool,
    ) -> Result<(), RabbitMQError> {
        if self.skip_if_closed("consume", queue).await {
            return Ok(());
        }
        self.client.consume(queue, handler, auto_ack).await
    }

    pub async fn purge(&self, queue: &str) -> Result<u32, RabbitMQError> {
        if self.skip_if_closed("purge", queue).await {
            return Ok(0);
        }
        self.client.purge_queue(queue).await
    }

    pub async fn delete(&self, queue: &str) -> Result<u32, RabbitMQError> {
        if self.skip_if_closed("delete", queue).await {
            return Ok(0);
        }
        self.client.delete_queue(queue).await
    }

    /// Stops the client; later calls are no-ops
    pub async fn close(&self) -> Result<(), RabbitMQError> {
        let mut closed = self.closed.lock().await;
        if *closed {
            warn!("queue repository already closed");
            return Ok(());
        }
        *closed = true;

        self.client.stop().await?;
        info!("queue repository closed");
        Ok(())
    }
}

#[async_trait]
impl EventQueue for QueueRepository {
    async fn publish(&self, queue: &str, message: Message) -> Result<(), RabbitMQError> {
        if self.skip_if_closed("publish", queue).await {
            return Err(RabbitMQError::ClientStopped);
        }
        self.client.publish(queue, message).await
    }
}
