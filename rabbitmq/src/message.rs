use amqprs::{BasicProperties, channel::ConsumerMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::RabbitMQError;

/// AMQP delivery mode flagging a message as persistent
pub const DELIVERY_MODE_PERSISTENT: u8 = 2;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Error returned by a [`MessageHandler`]
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Message to be published to RabbitMQ
///
/// Every message is published persistent. Messages built with [`Message::json`]
/// also carry the `application/json` content type.
#[derive(Debug, Clone)]
pub struct Message {
    content: Vec<u8>,
    content_type: Option<&'static str>,
    message_id: String,
}

impl<T: AsRef<[u8]>> From<T> for Message {
    fn from(value: T) -> Self {
        Message::content(value.as_ref().to_vec())
    }
}

impl Message {
    pub fn content(content: Vec<u8>) -> Self {
        Self {
            content,
            content_type: None,
            message_id: Uuid::new_v4().to_string(),
        }
    }

    /// Serializes a structured payload into a JSON message
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self, RabbitMQError> {
        let content = serde_json::to_vec(payload)
            .map_err(|err| RabbitMQError::SerializationError(err.to_string()))?;

        Ok(Self {
            content,
            content_type: Some(JSON_CONTENT_TYPE),
            message_id: Uuid::new_v4().to_string(),
        })
    }

    /// Overrides the generated message id
    pub fn with_message_id(mut self, message_id: &str) -> Self {
        self.message_id = message_id.to_owned();
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.content
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub(crate) fn into_parts(self, app_id: &str) -> (BasicProperties, Vec<u8>) {
        let mut props = BasicProperties::default();
        props
            .with_app_id(app_id)
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_message_id(&self.message_id)
            .with_timestamp(Utc::now().timestamp().max(0) as u64);
        if let Some(content_type) = self.content_type {
            props.with_content_type(content_type);
        }

        (props.finish(), self.content)
    }
}

/// A message received from a queue, handed to a [`MessageHandler`]
#[derive(Debug, Clone)]
pub struct Delivery {
    queue: String,
    delivery_tag: u64,
    redelivered: bool,
    message_id: Option<String>,
    body: Vec<u8>,
}

impl Delivery {
    pub fn new(queue: &str, delivery_tag: u64, body: Vec<u8>) -> Self {
        Self {
            queue: queue.to_owned(),
            delivery_tag,
            redelivered: false,
            message_id: None,
            body,
        }
    }

    pub(crate) fn from_consumer_message(
        queue: &str,
        message: ConsumerMessage,
    ) -> Result<Self, RabbitMQError> {
        let deliver = message.deliver.ok_or(RabbitMQError::NotDeliveryTag)?;
        let message_id = message
            .basic_properties
            .as_ref()
            .and_then(|props| props.message_id().cloned());

        Ok(Self {
            queue: queue.to_owned(),
            delivery_tag: deliver.delivery_tag(),
            redelivered: deliver.redelivered(),
            message_id,
            body: message.content.unwrap_or_default(),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Processes messages delivered by [`crate::RabbitMQClient::consume`]
///
/// Returning an error rejects the message without requeue.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, delivery: &Delivery) -> Result<(), HandlerError>;
}

/// Record republished to the error queue when a handler fails
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct ErrorRecord {
    /// Queue the failed message was consumed from
    pub queue: String,
    /// Original body, as JSON when it parses and as text otherwise
    pub payload: serde_json::Value,
    /// Description of the handler failure
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(delivery: &Delivery, error: &str) -> Self {
        let payload = serde_json::from_slice(delivery.body()).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(delivery.body()).into_owned())
        });

        Self {
            queue: delivery.queue().to_owned(),
            payload,
            error: error.to_owned(),
            failed_at: Utc::now(),
        }
    }
}
