use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use crate::config::{ConfigError, EventSettings};
use crate::events::{EventHandler, EventRegistry};

/// Fully populated configuration of one event type
#[derive(Clone)]
pub struct EventTypeConfig {
    pub queue_name: String,
    /// Accepted occurrences before the type is rejected
    pub threshold: u32,
    /// Cooldown between two accepted events
    pub window_minutes: u32,
    pub handler: Arc<dyn EventHandler>,
}

impl EventTypeConfig {
    pub fn window(&self) -> Duration {
        Duration::minutes(i64::from(self.window_minutes))
    }
}

impl fmt::Debug for EventTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTypeConfig")
            .field("queue_name", &self.queue_name)
            .field("threshold", &self.threshold)
            .field("window_minutes", &self.window_minutes)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Configuration of every event type the pipeline filters and publishes
#[derive(Debug, Clone, Default)]
pub struct EventTypeTable {
    entries: HashMap<String, EventTypeConfig>,
}

impl EventTypeTable {
    /// Builds the table for every registered handler
    ///
    /// Types without an override get the defaults of `settings`.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingHandler` if an override names an event
    /// type that has no registered handler.
    pub fn build(settings: &EventSettings, registry: &EventRegistry) -> Result<Self, ConfigError> {
        if let Some(orphan) = settings
            .overrides
            .keys()
            .find(|event_type| !registry.contains(event_type))
        {
            return Err(ConfigError::MissingHandler(orphan.clone()));
        }

        let entries = registry
            .registered_handlers()
            .into_iter()
            .map(|(event_type, handler)| {
                let custom = settings.overrides.get(&event_type);
                let config = EventTypeConfig {
                    queue_name: custom
                        .and_then(|o| o.queue_name.clone())
                        .unwrap_or_else(|| settings.default_queue.clone()),
                    threshold: custom
                        .and_then(|o| o.threshold)
                        .unwrap_or(settings.default_threshold),
                    window_minutes: custom
                        .and_then(|o| o.window_minutes)
                        .unwrap_or(settings.default_window_minutes),
                    handler,
                };
                (event_type, config)
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, EventTypeConfig)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, event_type: &str) -> Option<&EventTypeConfig> {
        self.entries.get(event_type)
    }

    pub fn queue_name(&self, event_type: &str) -> Option<&str> {
        self.entries.get(event_type).map(|c| c.queue_name.as_str())
    }

    /// Distinct destination queues, sorted
    pub fn queue_names(&self) -> Vec<String> {
        let mut queues: Vec<String> = self.entries.values().map(|c| c.queue_name.clone()).collect();
        queues.sort();
        queues.dedup();
        queues
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
