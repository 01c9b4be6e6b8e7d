//--------------------------------------------------------------------------------------------------
// STRUCTS & FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | Pipeline                | Composition root wiring every component           | build             |
// |                         |                                                   | run_until         |
// |                         |                                                   | emit              |
// | default_registry        | Binds the built-in event types to their counters  |                   |
//--------------------------------------------------------------------------------------------------

use std::future::Future;
use std::sync::Arc;

use rabbitmq::{RabbitMQClient, RabbitMQError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError};
use crate::events::{
    AlertSink, CounterHandler, Details, ERROR_EVENT_TYPES, EventDispatcher, EventFactory,
    EventRegistry, LogAlertSink, SECURITY_EVENT_TYPES,
};
use crate::filtering::{EventTypeTable, FilterService};
use crate::monitor::EventMonitor;
use crate::producer::{EventProducer, ProduceOutcome, ProducerError};
use crate::publisher::EventPublisher;
use crate::queue::QueueRepository;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("queue error: {0}")]
    Queue(#[from] RabbitMQError),

    #[error(transparent)]
    Producer(#[from] ProducerError),
}

/// Registry binding the error and security event types to their counters
pub fn default_registry(
    error_counter: Arc<CounterHandler>,
    security_counter: Arc<CounterHandler>,
) -> EventRegistry {
    let registry = EventRegistry::new();
    for event_type in ERROR_EVENT_TYPES {
        registry.register_handler(event_type, error_counter.clone());
    }
    for event_type in SECURITY_EVENT_TYPES {
        registry.register_handler(event_type, security_counter.clone());
    }
    registry
}

/// Every component of the monitoring pipeline, built once at startup
pub struct Pipeline {
    table: Arc<EventTypeTable>,
    repository: Arc<QueueRepository>,
    dispatcher: Arc<EventDispatcher>,
    producer: EventProducer,
    monitor: EventMonitor,
    error_counter: Arc<CounterHandler>,
    security_counter: Arc<CounterHandler>,
}

impl Pipeline {
    /// Wires the pipeline for `config`, alerting through the log
    pub fn build(config: &Config) -> Result<Self, AppError> {
        Self::build_with_sink(config, Arc::new(LogAlertSink))
    }

    pub fn build_with_sink(config: &Config, sink: Arc<dyn AlertSink>) -> Result<Self, AppError> {
        let error_counter = Arc::new(CounterHandler::errors(
            config.error_alert_every,
            Arc::clone(&sink),
        ));
        let security_counter = Arc::new(CounterHandler::security(config.security_alert_every, sink));

        let registry = default_registry(Arc::clone(&error_counter), Arc::clone(&security_counter));
        let table = Arc::new(EventTypeTable::build(&config.events, &registry)?);
        let dispatcher = Arc::new(EventDispatcher::from_registry(&registry));

        let client = Arc::new(RabbitMQClient::new(config.client_options()));
        let repository = Arc::new(QueueRepository::new(client));

        let filter = Arc::new(FilterService::new(
            Arc::clone(&table),
            config.events.counter_reset,
        ));
        let publisher = EventPublisher::new(repository.clone(), Arc::clone(&table));
        let producer = EventProducer::new(filter, EventFactory::default(), publisher);

        let monitor = EventMonitor::new(
            config.monitor.log_paths.clone(),
            Arc::clone(&dispatcher),
            config.observer_options(),
        );

        info!(
            event_types = table.len(),
            queues = ?table.queue_names(),
            log_files = config.monitor.log_paths.len(),
            counter_reset = %config.events.counter_reset,
            "pipeline built"
        );

        Ok(Self {
            table,
            repository,
            dispatcher,
            producer,
            monitor,
            error_counter,
            security_counter,
        })
    }

    pub fn table(&self) -> &Arc<EventTypeTable> {
        &self.table
    }

    pub fn repository(&self) -> &Arc<QueueRepository> {
        &self.repository
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn producer(&self) -> &EventProducer {
        &self.producer
    }

    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }

    pub fn error_counter(&self) -> &Arc<CounterHandler> {
        &self.error_counter
    }

    pub fn security_counter(&self) -> &Arc<CounterHandler> {
        &self.security_counter
    }

    /// Pushes one event through filter, factory and publisher
    pub async fn emit(
        &self,
        event_type: &str,
        details: Details,
    ) -> Result<ProduceOutcome, ProducerError> {
        self.producer.produce_event(event_type, details).await
    }

    /// Runs observers and, with `consume`, the consumer of `queue` until
    /// `shutdown` resolves or the consumer fails
    ///
    /// Observers are always stopped and the repository closed before
    /// returning.
    ///
    /// # Errors
    /// Returns the consumer error if consuming stopped on its own.
    pub async fn run_until<F>(&self, consume: bool, queue: &str, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        let observers = self.monitor.start_observers().await;
        info!(observers, consume, queue, "pipeline running");

        let mut consumer = consume.then(|| self.spawn_consumer(queue));
        tokio::pin!(shutdown);

        let finished = match consumer.as_mut() {
            Some(handle) => tokio::select! {
                _ = &mut shutdown => None,
                result = handle => Some(result),
            },
            None => {
                shutdown.await;
                None
            }
        };
        if finished.is_none() {
            info!("shutdown requested");
        }

        self.monitor.stop_observers().await;
        if let Err(err) = self.repository.close().await {
            warn!(error = %err, "failed to close queue repository cleanly");
        }

        let consumer_result = match (finished, consumer) {
            (Some(result), _) => Some(result),
            (None, Some(handle)) => Some(handle.await),
            (None, None) => None,
        };

        match consumer_result {
            Some(Ok(Err(err))) => {
                error!(queue, error = %err, "consumer stopped with an error");
                Err(err.into())
            }
            Some(Err(err)) => {
                error!(queue, error = %err, "consumer task failed");
                Ok(())
            }
            _ => {
                info!("pipeline stopped");
                Ok(())
            }
        }
    }

    fn spawn_consumer(&self, queue: &str) -> JoinHandle<Result<(), RabbitMQError>> {
        let repository = Arc::clone(&self.repository);
        let dispatcher = Arc::clone(&self.dispatcher);
        let queue = queue.to_owned();

        tokio::spawn(async move { repository.consume(&queue, dispatcher.as_ref(), false).await })
    }
}
