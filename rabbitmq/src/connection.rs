use amqprs::{
    Ack, BasicProperties, Cancel, Close, Nack, Return,
    callbacks::{ChannelCallback, ConnectionCallback},
    channel::Channel,
    connection::{Connection, OpenConnectionArguments},
};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::RabbitMQError;

/// Connection plus the single channel the client works on
pub(crate) struct Session {
    pub(crate) connection: Connection,
    pub(crate) channel: Option<Channel>,
}

impl Session {
    pub(crate) fn is_usable(&self) -> bool {
        self.connection.is_open() && self.channel.as_ref().is_some_and(|ch| ch.is_open())
    }
}

pub(crate) async fn open_rabbit_connection(
    connection_string: &str,
) -> Result<Connection, RabbitMQError> {
    let open_conn_args = OpenConnectionArguments::try_from(connection_string).map_err(|err| {
        error!(error = %err, "failed to parse connection string");
        RabbitMQError::UriError(err.to_string())
    })?;

    debug!("connecting to RabbitMQ server");
    let conn = Connection::open(&open_conn_args).await.map_err(|err| {
        error!(error = %err, "failed to connect to RabbitMQ");
        RabbitMQError::ConnectionError(err.to_string())
    })?;

    conn.register_callback(RabbitConnectionCallback)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to register connection callback");
            RabbitMQError::ConnectionError(err.to_string())
        })?;

    info!("RabbitMQ connection established");
    Ok(conn)
}

pub(crate) async fn open_rabbit_channel(conn: &Connection) -> Result<Channel, RabbitMQError> {
    let rabbit_channel = conn.open_channel(None).await.map_err(|err| {
        error!(error = %err, "failed to open channel");
        RabbitMQError::OpenChannelError(err.to_string())
    })?;

    rabbit_channel
        .register_callback(RabbitChannelCallback)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to register channel callback");
            RabbitMQError::OpenChannelError(err.to_string())
        })?;

    debug!(channel_id = rabbit_channel.channel_id(), "RabbitMQ channel opened");
    Ok(rabbit_channel)
}

struct RabbitConnectionCallback;

#[async_trait]
impl ConnectionCallback for RabbitConnectionCallback {
    async fn close(
        &mut self,
        _connection: &Connection,
        close: Close,
    ) -> Result<(), amqprs::error::Error> {
        warn!("connection closed by server: {:?}", close);
        Ok(())
    }

    async fn blocked(&mut self, _connection: &Connection, reason: String) {
        warn!(%reason, "connection blocked");
    }

    async fn unblocked(&mut self, _connection: &Connection) {
        info!("connection unblocked");
    }

    async fn secret_updated(&mut self, _connection: &Connection) {
        debug!("connection secret updated");
    }
}

struct RabbitChannelCallback;

#[async_trait]
impl ChannelCallback for RabbitChannelCallback {
    async fn close(
        &mut self,
        channel: &Channel,
        close: amqprs::CloseChannel,
    ) -> Result<(), amqprs::error::Error> {
        warn!(channel_id = channel.channel_id(), "channel closed by server: {:?}", close);
        Ok(())
    }

    async fn cancel(&mut self, channel: &Channel, cancel: Cancel) -> Result<(), amqprs::error::Error> {
        warn!(channel_id = channel.channel_id(), "consumer cancelled by server: {:?}", cancel);
        Ok(())
    }

    async fn flow(&mut self, _channel: &Channel, active: bool) -> Result<bool, amqprs::error::Error> {
        debug!(active, "channel flow");
        Ok(true)
    }

    async fn publish_ack(&mut self, _channel: &Channel, _ack: Ack) {}

    async fn publish_nack(&mut self, channel: &Channel, nack: Nack) {
        warn!(channel_id = channel.channel_id(), "publish nacked by broker: {:?}", nack);
    }

    async fn publish_return(
        &mut self,
        channel: &Channel,
        _return: Return,
        _props: BasicProperties,
        content: Vec<u8>,
    ) {
        warn!(
            channel_id = channel.channel_id(),
            bytes = content.len(),
            "message returned by broker"
        );
    }
}
