//! Entry point for application code raising monitored events.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::events::{Details, EventError, EventFactory};
use crate::filtering::FilterService;
use crate::publisher::EventPublisher;

/// Failures inside the producer itself; publishing problems are not errors
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error(transparent)]
    Event(#[from] EventError),
}

/// What happened to a produced event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProduceOutcome {
    /// Rejected by the threshold or cooldown gate
    Filtered,
    Published { queue: String, event_id: Uuid },
    /// Built but not delivered; the cause was logged
    PublishFailed { event_id: Uuid },
}

/// Runs filter, factory and publisher in that order
pub struct EventProducer {
    filter: Arc<FilterService>,
    factory: EventFactory,
    publisher: EventPublisher,
}

impl EventProducer {
    pub fn new(filter: Arc<FilterService>, factory: EventFactory, publisher: EventPublisher) -> Self {
        Self {
            filter,
            factory,
            publisher,
        }
    }

    pub fn filter(&self) -> &Arc<FilterService> {
        &self.filter
    }

    /// Filters, builds and publishes one event
    ///
    /// # Errors
    /// Only invalid events are errors. A filtered event or a failed publish is
    /// reported through [`ProduceOutcome`].
    pub async fn produce_event(
        &self,
        event_type: &str,
        details: Details,
    ) -> Result<ProduceOutcome, ProducerError> {
        EventFactory::validate_event_type(event_type)?;

        if !self.filter.should_create_event(event_type, &details) {
            info!(event_type, "event filtered");
            return Ok(ProduceOutcome::Filtered);
        }

        let event = self.factory.create_event(event_type, details)?;
        let event_id = event.event_id();

        match self.publisher.publish(&event).await {
            Ok(queue) => {
                info!(event_type, %event_id, queue = %queue, kind = %event.kind(), "event produced");
                Ok(ProduceOutcome::Published { queue, event_id })
            }
            Err(err) => {
                error!(event_type, %event_id, error = %err, "failed to publish event");
                Ok(ProduceOutcome::PublishFailed { event_id })
            }
        }
    }
}
