use std::collections::HashSet;

use super::event_types::{
    Details, ErrorEvent, EventError, EventKind, EventResult, MonitorEvent, MonitoringEvent,
    SecurityEvent,
};

/// Event types built as [`SecurityEvent`]s and routed to the security counter
pub const SECURITY_EVENT_TYPES: &[&str] = &[
    "security_alert",
    "rate_limit_violation",
    "unauthorized_access",
    "failed_login",
    "suspicious_activity",
];

/// Event types built as [`ErrorEvent`]s and routed to the error counter
pub const ERROR_EVENT_TYPES: &[&str] = &["error", "exception", "database_error", "external_api_error"];

/// Builds typed events from an event type and its details
#[derive(Debug, Clone)]
pub struct EventFactory {
    security_types: HashSet<String>,
    error_types: HashSet<String>,
}

impl Default for EventFactory {
    fn default() -> Self {
        Self::with_types(SECURITY_EVENT_TYPES, ERROR_EVENT_TYPES)
    }
}

impl EventFactory {
    pub fn with_types(security_types: &[&str], error_types: &[&str]) -> Self {
        Self {
            security_types: security_types.iter().map(|t| t.to_string()).collect(),
            error_types: error_types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn kind_of(&self, event_type: &str) -> EventKind {
        if self.security_types.contains(event_type) {
            EventKind::Security
        } else if self.error_types.contains(event_type) {
            EventKind::Error
        } else {
            EventKind::Generic
        }
    }

    /// Rejects event types that can never be routed
    pub fn validate_event_type(event_type: &str) -> EventResult<()> {
        if event_type.trim().is_empty() {
            return Err(EventError::Validation("event_type must not be empty".into()));
        }
        if event_type.chars().any(char::is_whitespace) {
            return Err(EventError::Validation(format!(
                "event_type {:?} must not contain whitespace",
                event_type
            )));
        }
        Ok(())
    }

    pub fn create_event(&self, event_type: &str, details: Details) -> EventResult<MonitorEvent> {
        Self::validate_event_type(event_type)?;

        let event = match self.kind_of(event_type) {
            EventKind::Security => MonitorEvent::Security(SecurityEvent::new(event_type, details)),
            EventKind::Error => MonitorEvent::Error(ErrorEvent::new(event_type, details)),
            EventKind::Generic => MonitorEvent::Generic(MonitoringEvent::new(event_type, details)),
        };
        Ok(event)
    }
}
