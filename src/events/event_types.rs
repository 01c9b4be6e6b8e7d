//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | Event                   | Event type plus free-form details                 | from_json_line    |
// | MonitoringEvent         | Event stamped with an id and a UTC timestamp      | to_dict           |
// | SecurityEvent           | Monitoring event for security event types         | source_ip         |
// | ErrorEvent              | Monitoring event for error event types            | error_message     |
// | MonitorEvent            | Any event produced by the factory                 | to_dict, to_json  |
// | EventError              | Error types for event processing                  |                   |
//--------------------------------------------------------------------------------------------------

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Event type used when a parsed log line carries none
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// Free-form structured payload of an event
pub type Details = serde_json::Map<String, Value>;

/// Errors that can occur in the event system
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// Event rejected before it was built or published
    #[error("Invalid event: {0}")]
    Validation(String),

    /// Input could not be parsed into an event
    #[error("Failed to parse event: {0}")]
    Parse(String),

    /// Event could not be encoded
    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    /// A handler failed to process an event
    #[error("Handler {handler} failed to process {event_type} event: {reason}")]
    HandlerFailed {
        handler: String,
        event_type: String,
        reason: String,
    },
}

/// Type alias for Result with EventError
pub type EventResult<T> = Result<T, EventError>;

/// Something noteworthy, identified by its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub details: Details,
}

impl Event {
    pub fn new(event_type: impl Into<String>, details: Details) -> Self {
        Self {
            event_type: event_type.into(),
            details,
        }
    }

    /// Flat map representation used on the wire
    pub fn to_dict(&self) -> Details {
        let mut dict = Details::new();
        dict.insert("event_type".into(), Value::String(self.event_type.clone()));
        dict.insert("details".into(), Value::Object(self.details.clone()));
        dict
    }

    /// Parses one log line
    ///
    /// The line must be a JSON object. `event_type` falls back to
    /// [`UNKNOWN_EVENT_TYPE`]; `details` is the nested `details` object when
    /// there is one, otherwise every other field of the line.
    pub fn from_json_line(line: &str) -> EventResult<Self> {
        let value: Value =
            serde_json::from_str(line.trim()).map_err(|err| EventError::Parse(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Parses a queue message body, accepting the [`MonitoringEvent`] shape too
    pub fn from_json_slice(body: &[u8]) -> EventResult<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|err| EventError::Parse(err.to_string()))?;
        Self::from_json_value(value)
    }

    fn from_json_value(value: Value) -> EventResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(EventError::Parse("expected a JSON object".into()));
        };

        let event_type = match fields.remove("event_type") {
            Some(Value::String(event_type)) if !event_type.trim().is_empty() => event_type,
            _ => UNKNOWN_EVENT_TYPE.to_owned(),
        };

        let details = match fields.remove("details") {
            Some(Value::Object(details)) => details,
            Some(other) => {
                fields.insert("details".into(), other);
                fields
            }
            None => fields,
        };

        Ok(Self {
            event_type,
            details,
        })
    }
}

/// An [`Event`] stamped with a unique id and its creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringEvent {
    event_id: Uuid,
    timestamp: DateTime<Utc>,
    event_type: String,
    details: Details,
}

impl MonitoringEvent {
    pub fn new(event_type: impl Into<String>, details: Details) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: event_type.into(),
            details,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn to_dict(&self) -> Details {
        let mut dict = Details::new();
        dict.insert("event_id".into(), Value::String(self.event_id.to_string()));
        dict.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        dict.insert("event_type".into(), Value::String(self.event_type.clone()));
        dict.insert("details".into(), Value::Object(self.details.clone()));
        dict
    }

    fn detail_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.details.get(*key).and_then(Value::as_str))
    }
}

impl From<&MonitoringEvent> for Event {
    fn from(event: &MonitoringEvent) -> Self {
        Event::new(event.event_type.clone(), event.details.clone())
    }
}

/// Monitoring event raised for security relevant event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityEvent(MonitoringEvent);

impl SecurityEvent {
    pub fn new(event_type: impl Into<String>, details: Details) -> Self {
        Self(MonitoringEvent::new(event_type, details))
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.0.detail_str(&["source_ip", "ip", "client_ip"])
    }

    /// Severity reported in the details, `high` when absent
    pub fn severity(&self) -> &str {
        self.0.detail_str(&["severity"]).unwrap_or("high")
    }
}

/// Monitoring event raised for error event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorEvent(MonitoringEvent);

impl ErrorEvent {
    pub fn new(event_type: impl Into<String>, details: Details) -> Self {
        Self(MonitoringEvent::new(event_type, details))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.0.detail_str(&["error_message", "message", "error"])
    }

    pub fn stack(&self) -> Option<&str> {
        self.0.detail_str(&["stack", "traceback"])
    }
}

/// Classification the factory assigns to an event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Generic,
    Security,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Generic => write!(f, "generic"),
            EventKind::Security => write!(f, "security"),
            EventKind::Error => write!(f, "error"),
        }
    }
}

/// Any event built by the [`super::EventFactory`]
///
/// All variants share one wire shape: `event_id`, `timestamp`, `event_type`
/// and `details`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonitorEvent {
    Generic(MonitoringEvent),
    Security(SecurityEvent),
    Error(ErrorEvent),
}

impl MonitorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MonitorEvent::Generic(_) => EventKind::Generic,
            MonitorEvent::Security(_) => EventKind::Security,
            MonitorEvent::Error(_) => EventKind::Error,
        }
    }

    pub fn as_monitoring(&self) -> &MonitoringEvent {
        match self {
            MonitorEvent::Generic(event) => event,
            MonitorEvent::Security(event) => &event.0,
            MonitorEvent::Error(event) => &event.0,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.as_monitoring().event_id()
    }

    pub fn event_type(&self) -> &str {
        self.as_monitoring().event_type()
    }

    pub fn details(&self) -> &Details {
        self.as_monitoring().details()
    }

    pub fn to_dict(&self) -> Details {
        self.as_monitoring().to_dict()
    }

    pub fn to_json(&self) -> EventResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|err| EventError::Serialization(err.to_string()))
    }
}
