/// Error types for RabbitMQ operations
#[derive(Debug, thiserror::Error)]
pub enum RabbitMQError {
    /// Error in the provided URI
    #[error("Provided URI Error: {0}")]
    UriError(String),
    /// Error establishing connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// Error opening a channel
    #[error("Error while opening a rabbitmq channel: {0}")]
    OpenChannelError(String),
    /// Error declaring a queue
    #[error("Error while declaring queue {queue}: {reason}")]
    QueueDeclarationError { queue: String, reason: String },
    /// Error purging a queue
    #[error("Error while purging queue {queue}: {reason}")]
    QueuePurgeError { queue: String, reason: String },
    /// Error deleting a queue
    #[error("Error while deleting queue {queue}: {reason}")]
    QueueDeleteError { queue: String, reason: String },
    /// Error setting the channel quality of service
    #[error("Error while setting channel qos: {0}")]
    QosError(String),
    /// Error starting to consume from a queue
    #[error("Error while starting to consume from queue {queue}: {reason}")]
    SubscriptionError { queue: String, reason: String },
    /// Error closing a channel
    #[error("Error while closing a channel: {0}")]
    CloseChannelError(String),
    /// The broker closed the channel while publishing
    #[error("Channel rejected publish to queue {queue}: {reason}")]
    ChannelRejected { queue: String, reason: String },
    /// Error publishing a message
    #[error("Error while publishing to queue {queue}: {reason}")]
    PublishError { queue: String, reason: String },
    /// Error while acknowledging a message
    #[error("Error while acknowledging a message: {0}")]
    AckMessageError(String),
    /// Error while negatively acknowledging a message
    #[error("Error while rejecting a message: {0}")]
    NackMessageError(String),
    /// Message does not contain delivery tag
    #[error("Unexpected error: message does not contain delivery tag")]
    NotDeliveryTag,
    /// Payload could not be encoded for the wire
    #[error("Failed to serialize message payload: {0}")]
    SerializationError(String),
    /// Request rejected before reaching the broker
    #[error("Invalid request: {0}")]
    ValidationError(String),
    /// The client was stopped and cannot reconnect
    #[error("RabbitMQ client has been stopped")]
    ClientStopped,
}

impl RabbitMQError {
    /// Whether the error came from the transport rather than the request
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            RabbitMQError::ConnectionError(_)
                | RabbitMQError::OpenChannelError(_)
                | RabbitMQError::ChannelRejected { .. }
        )
    }
}
