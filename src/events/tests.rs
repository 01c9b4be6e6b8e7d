#[cfg(test)]
pub mod tests {
    use crate::events::{
        AlertSink, CounterHandler, Details, DispatchOutcome, EventDispatcher, EventError,
        EventFactory, EventHandler, EventKind, EventRegistry, FnHandler, LogAlertSink, MonitorEvent,
        UNKNOWN_EVENT_TYPE, Event,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rabbitmq::{Delivery, MessageHandler};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Helper to build a details map from a json literal
    fn details(value: Value) -> Details {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    // Handler counting its invocations
    fn counting_handler(name: &str) -> (Arc<dyn EventHandler>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = FnHandler::shared(name, move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (handler, calls)
    }

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn send_alert(&self, title: &str, _message: &str, _fields: &Details) -> bool {
            self.alerts.lock().push(title.to_owned());
            true
        }
    }

    #[test]
    fn test_event_round_trip_keeps_type_and_details() {
        let event = Event::new("error", details(json!({"code": 500, "path": "/api"})));

        let encoded = serde_json::to_string(&event.to_dict()).unwrap();
        let decoded = Event::from_json_slice(encoded.as_bytes()).unwrap();

        assert_eq!(decoded.event_type, event.event_type);
        assert_eq!(decoded.details, event.details);
    }

    #[test]
    fn test_monitoring_event_round_trip() {
        let factory = EventFactory::default();
        let event = factory
            .create_event("security_alert", details(json!({"source_ip": "10.0.0.1"})))
            .unwrap();

        let dict = event.to_dict();
        assert_eq!(dict["event_id"], Value::String(event.event_id().to_string()));
        assert!(dict.contains_key("timestamp"));

        let decoded = Event::from_json_slice(&event.to_json().unwrap()).unwrap();
        assert_eq!(decoded.event_type, "security_alert");
        assert_eq!(&decoded.details, event.details());
    }

    #[test]
    fn test_serialized_event_matches_to_dict() {
        let event = EventFactory::default()
            .create_event("error", details(json!({"message": "boom"})))
            .unwrap();

        let serialized: Value = serde_json::from_slice(&event.to_json().unwrap()).unwrap();
        let dict = Value::Object(event.to_dict());

        assert_eq!(serialized["event_id"], dict["event_id"]);
        assert_eq!(serialized["event_type"], dict["event_type"]);
        assert_eq!(serialized["details"], dict["details"]);
    }

    #[test]
    fn test_factory_classifies_event_types() {
        let factory = EventFactory::default();

        let security = factory
            .create_event("rate_limit_violation", details(json!({"ip": "1.2.3.4"})))
            .unwrap();
        assert_eq!(security.kind(), EventKind::Security);
        match &security {
            MonitorEvent::Security(event) => {
                assert_eq!(event.source_ip(), Some("1.2.3.4"));
                assert_eq!(event.severity(), "high");
            }
            other => panic!("unexpected event {:?}", other),
        }

        let error = factory
            .create_event("database_error", details(json!({"message": "timeout"})))
            .unwrap();
        match &error {
            MonitorEvent::Error(event) => assert_eq!(event.error_message(), Some("timeout")),
            other => panic!("unexpected event {:?}", other),
        }

        let generic = factory.create_event("deploy", Details::new()).unwrap();
        assert_eq!(generic.kind(), EventKind::Generic);
    }

    #[test]
    fn test_factory_rejects_invalid_event_type() {
        let factory = EventFactory::default();

        assert!(matches!(
            factory.create_event("", Details::new()),
            Err(EventError::Validation(_))
        ));
        assert!(matches!(
            factory.create_event("two words", Details::new()),
            Err(EventError::Validation(_))
        ));
    }

    #[test]
    fn test_log_line_parsing() {
        // flat line: every other field becomes details
        let event = Event::from_json_line(r#"{"event_type":"error","message":"boom"}"#).unwrap();
        assert_eq!(event.event_type, "error");
        assert_eq!(event.details["message"], "boom");

        // nested details object is used as is
        let event =
            Event::from_json_line(r#"{"event_type":"error","details":{"code":1},"ts":2}"#).unwrap();
        assert_eq!(event.details, details(json!({"code": 1})));

        // missing event type
        let event = Event::from_json_line(r#"{"message":"no type"}"#).unwrap();
        assert_eq!(event.event_type, UNKNOWN_EVENT_TYPE);

        assert!(matches!(
            Event::from_json_line("plain text line"),
            Err(EventError::Parse(_))
        ));
        assert!(matches!(
            Event::from_json_line("[1, 2, 3]"),
            Err(EventError::Parse(_))
        ));
    }

    #[test]
    fn test_registry_last_write_wins() {
        let registry = EventRegistry::new();
        let (first, _) = counting_handler("first");
        let (second, _) = counting_handler("second");

        assert!(registry.register_handler("error", first).is_none());
        let replaced = registry.register_handler("error", second).unwrap();

        assert_eq!(replaced.name(), "first");
        assert_eq!(registry.handler("error").unwrap().name(), "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_snapshot_is_detached() {
        let registry = EventRegistry::new();
        let (handler, _) = counting_handler("errors");
        registry.register_handler("error", Arc::clone(&handler));

        let snapshot = registry.registered_handlers();
        registry.register_handler("security_alert", handler);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.event_types(), vec!["error", "security_alert"]);
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_registered_handler() {
        let registry = EventRegistry::new();
        let (handler, calls) = counting_handler("errors");
        registry.register_handler("error", handler);
        let dispatcher = EventDispatcher::from_registry(&registry);

        let outcome = dispatcher
            .dispatch_event(&Event::new("error", Details::new()))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_type_is_dropped() {
        let dispatcher = EventDispatcher::from_registry(&EventRegistry::new());

        let outcome = dispatcher
            .dispatch_event(&Event::new("never_registered", Details::new()))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Unhandled);
    }

    #[tokio::test]
    async fn test_dispatcher_rejects_bad_queue_messages() {
        let registry = EventRegistry::new();
        registry.register_handler(
            "error",
            FnHandler::shared("failing", |event| {
                Err(EventError::HandlerFailed {
                    handler: "failing".into(),
                    event_type: event.event_type.clone(),
                    reason: "boom".into(),
                })
            }),
        );
        let dispatcher = EventDispatcher::from_registry(&registry);

        let malformed = Delivery::new("events", 1, b"not json".to_vec());
        assert!(dispatcher.handle(&malformed).await.is_err());

        let failing = Delivery::new("events", 2, br#"{"event_type":"error","details":{}}"#.to_vec());
        let err = dispatcher.handle(&failing).await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        let unknown = Delivery::new("events", 3, br#"{"event_type":"other","details":{}}"#.to_vec());
        assert!(dispatcher.handle(&unknown).await.is_ok());
    }

    #[tokio::test]
    async fn test_counter_handler_alerts_every_n_events() {
        let sink = Arc::new(RecordingSink::default());
        let counter = CounterHandler::errors(2, sink.clone());
        let event = Event::new("error", Details::new());

        for _ in 0..5 {
            counter.handle_event(&event).await.unwrap();
        }
        counter
            .handle_event(&Event::new("exception", Details::new()))
            .await
            .unwrap();

        assert_eq!(counter.count("error"), 5);
        assert_eq!(counter.count("exception"), 1);
        assert_eq!(counter.total(), 6);
        assert_eq!(sink.alerts.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_counter_handler_without_alerts() {
        let sink = Arc::new(RecordingSink::default());
        let counter = CounterHandler::security(0, sink.clone());

        counter
            .handle_event(&Event::new("failed_login", Details::new()))
            .await
            .unwrap();

        assert_eq!(counter.snapshot().get("failed_login"), Some(&1));
        assert!(sink.alerts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_log_alert_sink_writes_fields() {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::WARN)
                .finish(),
        );
        let mut fields = Details::new();
        fields.insert("username".to_owned(), json!("admin"));

        let counter = CounterHandler::security(1, Arc::new(LogAlertSink));
        counter
            .handle_event(&Event::new("failed_login", fields.clone()))
            .await
            .unwrap();

        assert!(LogAlertSink.send_alert("title", "message", &fields).await);
        assert_eq!(counter.count("failed_login"), 1);
    }
}
