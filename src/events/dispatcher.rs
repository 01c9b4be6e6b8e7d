//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | EventDispatcher         | Routes events to the handler of their type        | dispatch_event    |
// | DispatchOutcome         | Whether a handler was found                       |                   |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;

use async_trait::async_trait;
use rabbitmq::{Delivery, HandlerError, MessageHandler};
use tracing::{debug, warn};

use super::event_types::{Event, EventResult};
use super::handlers::EventHandler;
use super::registry::{DispatchMap, EventRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The registered handler processed the event
    Handled,
    /// No handler is registered, the event was dropped
    Unhandled,
}

/// Dispatches events to the handler registered for their type
pub struct EventDispatcher {
    dispatch_map: DispatchMap,
}

impl EventDispatcher {
    pub fn new(dispatch_map: DispatchMap) -> Self {
        Self { dispatch_map }
    }

    /// Dispatcher over a snapshot of the registry
    pub fn from_registry(registry: &EventRegistry) -> Self {
        Self::new(registry.registered_handlers())
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.dispatch_map.contains_key(event_type)
    }

    pub fn handler(&self, event_type: &str) -> Option<Arc<dyn EventHandler>> {
        self.dispatch_map.get(event_type).cloned()
    }

    /// Runs the handler bound to `event.event_type`
    ///
    /// A missing handler is logged and reported as
    /// [`DispatchOutcome::Unhandled`]; only handler failures are errors.
    pub async fn dispatch_event(&self, event: &Event) -> EventResult<DispatchOutcome> {
        let Some(handler) = self.dispatch_map.get(&event.event_type) else {
            warn!(event_type = %event.event_type, "no handler registered, dropping event");
            return Ok(DispatchOutcome::Unhandled);
        };

        handler.handle_event(event).await?;
        debug!(event_type = %event.event_type, handler = handler.name(), "event handled");
        Ok(DispatchOutcome::Handled)
    }
}

/// Consumed queue messages are parsed and dispatched; a malformed body or a
/// failing handler rejects the message.
#[async_trait]
impl MessageHandler for EventDispatcher {
    async fn handle(&self, delivery: &Delivery) -> Result<(), HandlerError> {
        let event = Event::from_json_slice(delivery.body()).map_err(|err| {
            warn!(queue = delivery.queue(), error = %err, "malformed message body");
            err
        })?;

        self.dispatch_event(&event).await?;
        Ok(())
    }
}
