use amqp_wire::types::{AmqpDeliveryTag, FieldTable, ShortUint};
use bytes::{Bytes, BytesMut};

use super::{encode_frame, short_str, Channel, Outgoing, Responder};
use crate::{
    api::{
        deferred::{Consumer, Deferred},
        error::Result,
    },
    frame::{
        Ack, BasicProperties, Cancel, CancelOk, Consume, ConsumeOk, ContentHeader,
        ContentHeaderCommon, Nack, Publish, Qos, QosOk, Recover, RecoverOk, Reject,
    },
};

/// Arguments of `basic.qos`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BasicQosArguments {
    /// 0 means no limit.
    pub prefetch_size: u32,
    /// 0 means no limit.
    pub prefetch_count: ShortUint,
    /// Apply to the whole connection rather than per consumer.
    pub global: bool,
}

impl BasicQosArguments {
    pub fn new(prefetch_size: u32, prefetch_count: ShortUint, global: bool) -> Self {
        Self {
            prefetch_size,
            prefetch_count,
            global,
        }
    }
}

/// Arguments of `basic.consume`.
///
/// An empty consumer tag lets the broker generate one, which the consumer is
/// resolved with.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicConsumeArguments {
    pub queue: String,
    pub consumer_tag: String,
    pub no_local: bool,
    pub no_ack: bool,
    pub exclusive: bool,
    pub arguments: FieldTable,
}

impl BasicConsumeArguments {
    pub fn new(queue: &str, consumer_tag: &str) -> Self {
        Self {
            queue: queue.to_owned(),
            consumer_tag: consumer_tag.to_owned(),
            no_local: false,
            no_ack: false,
            exclusive: false,
            arguments: FieldTable::new(),
        }
    }

    impl_chainable_setter! {
        no_local: bool,
        no_ack: bool,
        exclusive: bool,
        arguments: FieldTable
    }
}

/// Arguments of `basic.publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicPublishArguments {
    pub exchange: String,
    pub routing_key: String,
    /// Return the message if it cannot be routed, see [`Channel::on_return`].
    pub mandatory: bool,
    pub immediate: bool,
}

impl BasicPublishArguments {
    pub fn new(exchange: &str, routing_key: &str) -> Self {
        Self {
            exchange: exchange.to_owned(),
            routing_key: routing_key.to_owned(),
            mandatory: false,
            immediate: false,
        }
    }

    impl_chainable_setter! {
        mandatory: bool,
        immediate: bool
    }
}

/////////////////////////////////////////////////////////////////////////////
impl Channel {
    pub fn qos(&self, args: BasicQosArguments) -> Result<Deferred<()>> {
        let qos = Qos::new(args.prefetch_size, args.prefetch_count, args.global);
        let deferred = Deferred::new();
        self.request(
            qos.into_frame(),
            QosOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }

    /// Start a consumer on a queue.
    ///
    /// Register the delivery handler with [`Consumer::on_received`]. Messages
    /// are delivered from the moment the broker accepted the consumer.
    pub fn consume(&self, args: BasicConsumeArguments) -> Result<Consumer> {
        let mut consume = Consume::new(
            short_str("queue name", &args.queue)?,
            short_str("consumer tag", &args.consumer_tag)?,
            args.arguments,
        );
        consume.set_no_local(args.no_local);
        consume.set_no_ack(args.no_ack);
        consume.set_exclusive(args.exclusive);

        let consumer = Consumer::new();
        self.request(
            consume.into_frame(),
            ConsumeOk::header(),
            Responder::Consume(consumer.clone()),
        )?;
        Ok(consumer)
    }

    /// Cancel a consumer, resolved with its tag.
    ///
    /// Deliveries already on the way still reach the consumer until the
    /// broker confirmed.
    pub fn cancel(&self, consumer_tag: &str) -> Result<Deferred<String>> {
        let cancel = Cancel::new(short_str("consumer tag", consumer_tag)?, false);
        let deferred = Deferred::new();
        self.request(
            cancel.into_frame(),
            CancelOk::header(),
            Responder::Cancel(deferred.clone()),
        )?;
        Ok(deferred)
    }

    /// Redeliver the unacknowledged messages of this channel.
    pub fn recover(&self, requeue: bool) -> Result<Deferred<()>> {
        let deferred = Deferred::new();
        self.request(
            Recover::new(requeue).into_frame(),
            RecoverOk::header(),
            Responder::Unit(deferred.clone()),
        )?;
        Ok(deferred)
    }

    /// Publish a message.
    ///
    /// The message is queued behind the pending synchronous operations of the
    /// channel and held while the broker stops the channel flow. The body is
    /// split in frames of the negotiated frame size when it is sent.
    pub fn publish(
        &self,
        args: BasicPublishArguments,
        properties: BasicProperties,
        body: impl Into<Bytes>,
    ) -> Result<()> {
        let body: Bytes = body.into();
        let mut publish = Publish::new(
            short_str("exchange name", &args.exchange)?,
            short_str("routing key", &args.routing_key)?,
        );
        publish.set_mandatory(args.mandatory);
        publish.set_immediate(args.immediate);

        let header = ContentHeader::new(
            ContentHeaderCommon::basic(body.len() as u64),
            properties,
        );
        let mut preamble = BytesMut::new();
        preamble.extend_from_slice(&encode_frame(self.channel_id(), publish.into_frame())?);
        preamble.extend_from_slice(&encode_frame(self.channel_id(), header.into_frame())?);

        self.enqueue(Outgoing::Publish {
            preamble: preamble.freeze(),
            body,
        })
    }

    /// Acknowledge one message.
    pub fn ack(&self, delivery_tag: AmqpDeliveryTag) -> Result<()> {
        self.send_now(Ack::new(delivery_tag, false).into_frame())
    }

    /// Acknowledge all messages up to and including `delivery_tag`.
    pub fn ack_multiple(&self, delivery_tag: AmqpDeliveryTag) -> Result<()> {
        self.send_now(Ack::new(delivery_tag, true).into_frame())
    }

    pub fn nack(&self, delivery_tag: AmqpDeliveryTag, requeue: bool) -> Result<()> {
        self.send_now(Nack::new(delivery_tag, false, requeue).into_frame())
    }

    pub fn reject(&self, delivery_tag: AmqpDeliveryTag, requeue: bool) -> Result<()> {
        self.send_now(Reject::new(delivery_tag, requeue).into_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_arguments() {
        let args = BasicConsumeArguments::new("q1", "").no_ack(true).finish();
        assert_eq!("q1", args.queue);
        assert!(args.consumer_tag.is_empty());
        assert!(args.no_ack);
        assert!(!args.exclusive);
        assert!(!args.no_local);
    }

    #[test]
    fn test_publish_arguments() {
        let args = BasicPublishArguments::new("amq.topic", "echo.ping")
            .mandatory(true)
            .finish();
        assert_eq!("amq.topic", args.exchange);
        assert_eq!("echo.ping", args.routing_key);
        assert!(args.mandatory);
        assert!(!args.immediate);
    }

    #[test]
    fn test_qos_arguments() {
        let args = BasicQosArguments::new(0, 10, false);
        assert_eq!(10, args.prefetch_count);
        assert_eq!(BasicQosArguments::default(), BasicQosArguments::new(0, 0, false));
    }
}
