use amqp_wire::types::{
    AmqpExchangeName, AmqpMessageCount, AmqpQueueName, Boolean, FieldTable, LongUint, Octect,
    ShortStr, ShortUint,
};
use serde::{Deserialize, Serialize};

use super::impl_bit_setters;

mod bit_flag {
    pub mod declare {
        // continous bits packed into one or more octets, starting from the low bit in each octet.
        pub const PASSIVE: u8 = 0b0000_0001;
        pub const DURABLE: u8 = 0b0000_0010;
        pub const EXCLUSIVE: u8 = 0b0000_0100;
        pub const AUTO_DELETE: u8 = 0b0000_1000;
        pub const NO_WAIT: u8 = 0b0001_0000;
    }
    pub mod delete {
        pub const IF_UNUSED: u8 = 0b0000_0001;
        pub const IF_EMPTY: u8 = 0b0000_0010;
        pub const NO_WAIT: u8 = 0b0000_0100;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclareQueue {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub bits: Octect,
    pub arguments: FieldTable,
}

impl DeclareQueue {
    pub fn new(queue: AmqpQueueName, arguments: FieldTable) -> Self {
        Self {
            ticket: 0,
            queue,
            bits: 0,
            arguments,
        }
    }
}

impl_bit_setters!(DeclareQueue, bit_flag::declare:
    set_passive => PASSIVE,
    set_durable => DURABLE,
    set_exclusive => EXCLUSIVE,
    set_auto_delete => AUTO_DELETE,
    set_no_wait => NO_WAIT
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclareQueueOk {
    pub queue: AmqpQueueName,
    pub message_count: AmqpMessageCount,
    pub consumer_count: LongUint,
}

impl DeclareQueueOk {
    pub fn new(queue: AmqpQueueName, message_count: AmqpMessageCount, consumer_count: LongUint) -> Self {
        Self {
            queue,
            message_count,
            consumer_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindQueue {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub exchange: AmqpExchangeName,
    pub routing_key: ShortStr,
    pub no_wait: Boolean,
    pub arguments: FieldTable,
}

impl BindQueue {
    pub fn new(
        queue: AmqpQueueName,
        exchange: AmqpExchangeName,
        routing_key: ShortStr,
        arguments: FieldTable,
    ) -> Self {
        Self {
            ticket: 0,
            queue,
            exchange,
            routing_key,
            no_wait: false,
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BindQueueOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbindQueue {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub exchange: AmqpExchangeName,
    pub routing_key: ShortStr,
    pub arguments: FieldTable,
}

impl UnbindQueue {
    pub fn new(
        queue: AmqpQueueName,
        exchange: AmqpExchangeName,
        routing_key: ShortStr,
        arguments: FieldTable,
    ) -> Self {
        Self {
            ticket: 0,
            queue,
            exchange,
            routing_key,
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UnbindQueueOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeQueue {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub no_wait: Boolean,
}

impl PurgeQueue {
    pub fn new(queue: AmqpQueueName) -> Self {
        Self {
            ticket: 0,
            queue,
            no_wait: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeQueueOk {
    pub message_count: AmqpMessageCount,
}

impl PurgeQueueOk {
    pub fn new(message_count: AmqpMessageCount) -> Self {
        Self { message_count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQueue {
    pub ticket: ShortUint,
    pub queue: AmqpQueueName,
    pub bits: Octect,
}

impl DeleteQueue {
    pub fn new(queue: AmqpQueueName) -> Self {
        Self {
            ticket: 0,
            queue,
            bits: 0,
        }
    }
}

impl_bit_setters!(DeleteQueue, bit_flag::delete:
    set_if_unused => IF_UNUSED,
    set_if_empty => IF_EMPTY,
    set_no_wait => NO_WAIT
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQueueOk {
    pub message_count: AmqpMessageCount,
}

impl DeleteQueueOk {
    pub fn new(message_count: AmqpMessageCount) -> Self {
        Self { message_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_setters() {
        let mut declare = DeclareQueue::new("capy-test".try_into().unwrap(), FieldTable::new());
        declare.set_durable(true);
        declare.set_auto_delete(true);
        assert_eq!(0b0000_1010, declare.bits);
        declare.set_durable(false);
        declare.set_passive(true);
        assert_eq!(0b0000_1001, declare.bits);

        let mut delete = DeleteQueue::new("capy-test".try_into().unwrap());
        delete.set_if_empty(true);
        delete.set_no_wait(true);
        assert_eq!(0b0000_0110, delete.bits);
    }
}
