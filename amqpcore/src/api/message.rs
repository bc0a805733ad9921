use amqp_wire::types::{AmqpDeliveryTag, AmqpReplyCode};
use bytes::Bytes;

use crate::frame::BasicProperties;

/// A message delivered to a consumer.
///
/// The message is handed to the delivery callback by reference, clone what is
/// needed beyond the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub(crate) delivery_tag: AmqpDeliveryTag,
    pub(crate) redelivered: bool,
    pub(crate) exchange: String,
    pub(crate) routing_key: String,
    pub(crate) consumer_tag: String,
    pub(crate) properties: BasicProperties,
    pub(crate) body: Bytes,
}

impl Message {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_size(&self) -> usize {
        self.body.len()
    }

    pub fn delivery_tag(&self) -> AmqpDeliveryTag {
        self.delivery_tag
    }

    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn consumer_tag(&self) -> &str {
        &self.consumer_tag
    }

    pub fn properties(&self) -> &BasicProperties {
        &self.properties
    }
}

/// A `mandatory` message the broker could not route, returned to the publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnedMessage {
    pub(crate) reply_code: AmqpReplyCode,
    pub(crate) reply_text: String,
    pub(crate) exchange: String,
    pub(crate) routing_key: String,
    pub(crate) properties: BasicProperties,
    pub(crate) body: Bytes,
}

impl ReturnedMessage {
    pub fn reply_code(&self) -> AmqpReplyCode {
        self.reply_code
    }

    pub fn reply_text(&self) -> &str {
        &self.reply_text
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn properties(&self) -> &BasicProperties {
        &self.properties
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
