use amqp_wire::types::{
    AmqpConsumerTag, AmqpDeliveryTag, AmqpExchangeName, AmqpQueueName, AmqpReplyCode,
    AmqpReplyText, Boolean, FieldTable, LongUint, Octect, ShortStr, ShortUint,
};
use serde::{Deserialize, Serialize};

use super::impl_bit_setters;

mod bit_flag {
    pub mod consume {
        pub const NO_LOCAL: u8 = 0b0000_0001;
        pub const NO_ACK: u8 = 0b0000_0010;
        pub const EXCLUSIVE: u8 = 0b0000_0100;
        pub const NO_WAIT: u8 = 0b0000_1000;
    }
    pub mod publish {
        pub const MANDATORY: u8 = 0b0000_0001;
        pub const IMMEDIATE: u8 = 0b0000_0010;
    }
    pub mod nack {
        pub const MULTIPLE: u8 = 0b0000_0001;
        pub const REQUEUE: u8 = 0b0000_0010;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qos {
    pub prefetch_size: LongUint,
    pub prefetch_count: ShortUint,
    pub global: Boolean,
}

impl Qos {
    pub fn new(prefetch_size: LongUint, prefetch_count: ShortUint, global: Boolean) -> Self {
        Self {
            prefetch_size,
            prefetch_count,
            global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QosOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consume {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub consumer_tag: AmqpConsumerTag,
    pub bits: Octect,
    pub arguments: FieldTable,
}

impl Consume {
    pub fn new(queue: AmqpQueueName, consumer_tag: AmqpConsumerTag, arguments: FieldTable) -> Self {
        Self {
            ticket: 0,
            queue,
            consumer_tag,
            bits: 0,
            arguments,
        }
    }
}

impl_bit_setters!(Consume, bit_flag::consume:
    set_no_local => NO_LOCAL,
    set_no_ack => NO_ACK,
    set_exclusive => EXCLUSIVE,
    set_no_wait => NO_WAIT
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeOk {
    pub consumer_tag: AmqpConsumerTag,
}

impl ConsumeOk {
    pub fn new(consumer_tag: AmqpConsumerTag) -> Self {
        Self { consumer_tag }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancel {
    pub consumer_tag: AmqpConsumerTag,
    pub no_wait: Boolean,
}

impl Cancel {
    pub fn new(consumer_tag: AmqpConsumerTag, no_wait: Boolean) -> Self {
        Self {
            consumer_tag,
            no_wait,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOk {
    pub consumer_tag: AmqpConsumerTag,
}

impl CancelOk {
    pub fn new(consumer_tag: AmqpConsumerTag) -> Self {
        Self { consumer_tag }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publish {
    pub ticket: ShortUint,
    pub exchange: AmqpExchangeName,
    pub routing_key: ShortStr,
    pub bits: Octect,
}

impl Publish {
    pub fn new(exchange: AmqpExchangeName, routing_key: ShortStr) -> Self {
        Self {
            ticket: 0,
            exchange,
            routing_key,
            bits: 0,
        }
    }
}

impl_bit_setters!(Publish, bit_flag::publish:
    set_mandatory => MANDATORY,
    set_immediate => IMMEDIATE
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Return {
    pub reply_code: AmqpReplyCode,
    pub reply_text: AmqpReplyText,
    pub exchange: AmqpExchangeName,
    pub routing_key: ShortStr,
}

impl Return {
    pub fn new(
        reply_code: AmqpReplyCode,
        reply_text: AmqpReplyText,
        exchange: AmqpExchangeName,
        routing_key: ShortStr,
    ) -> Self {
        Self {
            reply_code,
            reply_text,
            exchange,
            routing_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliver {
    pub consumer_tag: AmqpConsumerTag,
    pub delivery_tag: AmqpDeliveryTag,
    pub redelivered: Boolean,
    pub exchange: AmqpExchangeName,
    pub routing_key: ShortStr,
}

impl Deliver {
    pub fn new(
        consumer_tag: AmqpConsumerTag,
        delivery_tag: AmqpDeliveryTag,
        redelivered: Boolean,
        exchange: AmqpExchangeName,
        routing_key: ShortStr,
    ) -> Self {
        Self {
            consumer_tag,
            delivery_tag,
            redelivered,
            exchange,
            routing_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub delivery_tag: AmqpDeliveryTag,
    pub multiple: Boolean,
}

impl Ack {
    pub fn new(delivery_tag: AmqpDeliveryTag, multiple: Boolean) -> Self {
        Self {
            delivery_tag,
            multiple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reject {
    pub delivery_tag: AmqpDeliveryTag,
    pub requeue: Boolean,
}

impl Reject {
    pub fn new(delivery_tag: AmqpDeliveryTag, requeue: Boolean) -> Self {
        Self {
            delivery_tag,
            requeue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recover {
    pub requeue: Boolean,
}

impl Recover {
    pub fn new(requeue: Boolean) -> Self {
        Self { requeue }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecoverOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nack {
    pub delivery_tag: AmqpDeliveryTag,
    pub bits: Octect,
}

impl Nack {
    pub fn new(delivery_tag: AmqpDeliveryTag, multiple: bool, requeue: bool) -> Self {
        let mut nack = Self {
            delivery_tag,
            bits: 0,
        };
        nack.set_multiple(multiple);
        nack.set_requeue(requeue);
        nack
    }
}

impl_bit_setters!(Nack, bit_flag::nack:
    set_multiple => MULTIPLE,
    set_requeue => REQUEUE
);
