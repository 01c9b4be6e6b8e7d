mod repository;

use async_trait::async_trait;
use rabbitmq::{Message, RabbitMQError};

pub use repository::QueueRepository;

/// Publishing side of the queue, as seen by the event publisher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn publish(&self, queue: &str, message: Message) -> Result<(), RabbitMQError>;
}
