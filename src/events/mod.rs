//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Event entities and the handler side of the pipeline. Events are built by the factory on the
// producer path; on the consumer path (queue messages and log lines) they are parsed and routed
// through the dispatcher to the handler registered for their type.
//
// | Component                | Description                                               |
// |--------------------------|-----------------------------------------------------------|
// | Event / MonitoringEvent  | Event entities and their wire representation             |
// | EventFactory             | Builds generic, security and error events                 |
// | EventHandler             | Trait for components that can handle events               |
// | EventRegistry            | Explicit event type to handler registry                   |
// | EventDispatcher          | Routes events to registered handlers                      |
//--------------------------------------------------------------------------------------------------

mod dispatcher;
mod event_types;
mod factory;
mod handlers;
mod registry;

#[cfg(test)]
mod tests;

// Re-exports
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use event_types::{
    Details, ErrorEvent, Event, EventError, EventKind, EventResult, MonitorEvent, MonitoringEvent,
    SecurityEvent, UNKNOWN_EVENT_TYPE,
};
pub use factory::{ERROR_EVENT_TYPES, EventFactory, SECURITY_EVENT_TYPES};
pub use handlers::{AlertSink, CounterHandler, EventHandler, FnHandler, LogAlertSink};
pub use registry::{DispatchMap, EventRegistry};
