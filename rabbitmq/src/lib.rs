//! RabbitMQ client used by the event pipeline.
//!
//! | Name              | Description                                              |
//! |-------------------|----------------------------------------------------------|
//! | RabbitMQClient    | One connection + channel, publish / consume / shutdown   |
//! | ClientOptions     | Broker URI, app id, consume timings, error queue         |
//! | Message           | Persistent message to publish (raw bytes or JSON)        |
//! | Delivery          | Message received by a consumer                           |
//! | MessageHandler    | Async callback run for every delivery                    |
//! | ErrorRecord       | Payload republished to the error queue on handler errors |
//! | RabbitMQError     | Error types for every broker operation                   |

mod client;
mod connection;
mod error;
mod message;

pub use client::{ClientOptions, ClientState, RabbitMQClient};
pub use error::RabbitMQError;
pub use message::{
    DELIVERY_MODE_PERSISTENT, Delivery, ErrorRecord, HandlerError, Message, MessageHandler,
};
