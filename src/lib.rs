//--------------------------------------------------------------------------------------------------
// CRATE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Event monitoring pipeline. Application code raises events through the producer, which filters
// them per type and publishes the survivors to RabbitMQ. Consumed queue messages and JSON lines
// appended to watched log files are dispatched to the handler registered for their event type.
//
// | Module                   | Description                                               |
// |--------------------------|-----------------------------------------------------------|
// | app                      | Composition root and run loop                             |
// | config                   | Environment and .env driven settings                      |
// | events                   | Event entities, factory, registry, dispatcher, handlers   |
// | filtering                | Threshold and cooldown gate per event type                |
// | logging                  | Tracing subscriber setup                                  |
// | monitor                  | Log file observers                                        |
// | producer / publisher     | Outbound path from application code to the queue         |
// | queue                    | Repository over the RabbitMQ client                       |
//--------------------------------------------------------------------------------------------------

// Expose the modules
pub mod app;
pub mod config;
pub mod events;
pub mod filtering;
pub mod logging;
pub mod monitor;
pub mod producer;
pub mod publisher;
pub mod queue;

// Re-export key types for easier usage
pub use app::{AppError, Pipeline, default_registry};
pub use config::{Config, ConfigError};
pub use events::{
    CounterHandler, Details, Event, EventDispatcher, EventError, EventFactory, EventHandler,
    EventRegistry, MonitorEvent,
};
pub use filtering::{CounterResetPolicy, EventTypeTable, FilterService};
pub use monitor::{EventMonitor, LineOutcome, ObserverOptions};
pub use producer::{EventProducer, ProduceOutcome, ProducerError};
pub use publisher::{EventPublisher, PublishError};
pub use queue::{EventQueue, QueueRepository};
