//! Publishes built events to the queue configured for their type.

use std::sync::Arc;

use rabbitmq::{Message, RabbitMQError};
use thiserror::Error;
use tracing::debug;

use crate::events::MonitorEvent;
use crate::filtering::EventTypeTable;
use crate::queue::EventQueue;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no configuration for event type {0}")]
    NoConfiguration(String),

    #[error("failed to encode {event_type} event: {source}")]
    Encoding {
        event_type: String,
        #[source]
        source: RabbitMQError,
    },

    #[error("failed to publish {event_type} event to queue {queue}: {source}")]
    Queue {
        event_type: String,
        queue: String,
        #[source]
        source: RabbitMQError,
    },
}

pub struct EventPublisher {
    queue: Arc<dyn EventQueue>,
    table: Arc<EventTypeTable>,
}

impl EventPublisher {
    pub fn new(queue: Arc<dyn EventQueue>, table: Arc<EventTypeTable>) -> Self {
        Self { queue, table }
    }

    /// Publishes `event` and returns the queue it went to
    pub async fn publish(&self, event: &MonitorEvent) -> Result<String, PublishError> {
        let event_type = event.event_type();
        let queue = self
            .table
            .queue_name(event_type)
            .ok_or_else(|| PublishError::NoConfiguration(event_type.to_owned()))?;

        let message = Message::json(event)
            .map_err(|source| PublishError::Encoding {
                event_type: event_type.to_owned(),
                source,
            })?
            .with_message_id(&event.event_id().to_string());

        self.queue
            .publish(queue, message)
            .await
            .map_err(|source| PublishError::Queue {
                event_type: event_type.to_owned(),
                queue: queue.to_owned(),
                source,
            })?;

        debug!(event_type, queue, event_id = %event.event_id(), "event published");
        Ok(queue.to_owned())
    }
}
