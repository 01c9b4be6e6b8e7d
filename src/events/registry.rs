use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::handlers::EventHandler;

/// Event type to handler binding
pub type DispatchMap = HashMap<String, Arc<dyn EventHandler>>;

/// Registry of the handlers known to the process
///
/// Built once by the composition root and passed to whoever needs it.
/// Registering a second handler for the same event type replaces the first
/// (last write wins) and logs a warning.
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<DispatchMap>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `event_type`, returning the handler it replaced
    pub fn register_handler(
        &self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Option<Arc<dyn EventHandler>> {
        let previous = self
            .handlers
            .write()
            .insert(event_type.to_owned(), Arc::clone(&handler));

        match &previous {
            Some(old) => warn!(
                event_type,
                previous = old.name(),
                handler = handler.name(),
                "replacing registered handler"
            ),
            None => debug!(event_type, handler = handler.name(), "handler registered"),
        }
        previous
    }

    /// Snapshot of the current bindings
    pub fn registered_handlers(&self) -> DispatchMap {
        self.handlers.read().clone()
    }

    pub fn handler(&self, event_type: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers.read().get(event_type).cloned()
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.handlers.read().contains_key(event_type)
    }

    /// Registered event types in sorted order
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.read().keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}
