//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | EventHandler            | Trait for event handling                          | handle_event      |
// | FnHandler               | Adapts a closure into an EventHandler             | new               |
// | AlertSink               | Boundary to alert senders (webhooks, chat-ops)    | send_alert        |
// | LogAlertSink            | AlertSink writing alerts to the log               | send_alert        |
// | CounterHandler          | Counts events per type and raises alerts          | count, snapshot   |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::event_types::{Details, Event, EventResult};

/// Event handler trait for processing events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Processes an event
    async fn handle_event(&self, event: &Event) -> EventResult<()>;
}

/// Handler backed by a synchronous closure
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Event) -> EventResult<()> + Send + Sync + 'static,
{
    pub fn new(name: &str, func: F) -> Self {
        Self {
            name: name.to_owned(),
            func,
        }
    }

    pub fn shared(name: &str, func: F) -> Arc<dyn EventHandler> {
        Arc::new(Self::new(name, func))
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&Event) -> EventResult<()> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle_event(&self, event: &Event) -> EventResult<()> {
        (self.func)(event)
    }
}

/// Destination for alerts raised by handlers
///
/// Returns whether the alert was delivered.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(&self, title: &str, message: &str, fields: &Details) -> bool;
}

/// Writes alerts as structured warnings
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn send_alert(&self, title: &str, message: &str, fields: &Details) -> bool {
        warn!(
            alert.title = title,
            alert.fields = %serde_json::Value::Object(fields.clone()),
            "{}",
            message
        );
        true
    }
}

/// Counts events per event type and alerts every `alert_every` occurrences
pub struct CounterHandler {
    name: &'static str,
    alert_every: u64,
    counts: Mutex<HashMap<String, u64>>,
    sink: Arc<dyn AlertSink>,
}

impl CounterHandler {
    pub fn new(name: &'static str, alert_every: u64, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            name,
            alert_every,
            counts: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Counter for error events
    pub fn errors(alert_every: u64, sink: Arc<dyn AlertSink>) -> Self {
        Self::new("error_counter", alert_every, sink)
    }

    /// Counter for security events
    pub fn security(alert_every: u64, sink: Arc<dyn AlertSink>) -> Self {
        Self::new("security_counter", alert_every, sink)
    }

    pub fn count(&self, event_type: &str) -> u64 {
        self.counts.lock().get(event_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.lock().clone()
    }
}

#[async_trait]
impl EventHandler for CounterHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle_event(&self, event: &Event) -> EventResult<()> {
        let count = {
            let mut counts = self.counts.lock();
            let count = counts.entry(event.event_type.clone()).or_insert(0);
            *count += 1;
            *count
        };
        debug!(handler = self.name, event_type = %event.event_type, count, "event counted");

        if self.alert_every == 0 || count % self.alert_every != 0 {
            return Ok(());
        }

        let title = format!("{} alert: {}", self.name, event.event_type);
        let message = format!("{} {} events observed", count, event.event_type);
        if !self.sink.send_alert(&title, &message, &event.details).await {
            warn!(handler = self.name, event_type = %event.event_type, "alert delivery failed");
        }
        Ok(())
    }
}
