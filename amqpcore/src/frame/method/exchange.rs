use amqp_wire::types::{AmqpExchangeName, FieldTable, Octect, ShortStr, ShortUint};
use serde::{Deserialize, Serialize};

use super::impl_bit_setters;

mod bit_flag {
    pub mod declare {
        pub const PASSIVE: u8 = 0b0000_0001;
        pub const DURABLE: u8 = 0b0000_0010;
        pub const AUTO_DELETE: u8 = 0b0000_0100;
        pub const INTERNAL: u8 = 0b0000_1000;
        pub const NO_WAIT: u8 = 0b0001_0000;
    }
    pub mod delete {
        pub const IF_UNUSED: u8 = 0b0000_0001;
        pub const NO_WAIT: u8 = 0b0000_0010;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declare {
    pub ticket: ShortUint,
    pub exchange: AmqpExchangeName,
    pub typ: ShortStr,
    pub bits: Octect,
    pub arguments: FieldTable,
}

impl Declare {
    pub fn new(exchange: AmqpExchangeName, typ: ShortStr, arguments: FieldTable) -> Self {
        Self {
            ticket: 0,
            exchange,
            typ,
            bits: 0,
            arguments,
        }
    }
}

impl_bit_setters!(Declare, bit_flag::declare:
    set_passive => PASSIVE,
    set_durable => DURABLE,
    set_auto_delete => AUTO_DELETE,
    set_internal => INTERNAL,
    set_no_wait => NO_WAIT
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeclareOk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub ticket: ShortUint,
    pub exchange: AmqpExchangeName,
    pub bits: Octect,
}

impl Delete {
    pub fn new(exchange: AmqpExchangeName) -> Self {
        Self {
            ticket: 0,
            exchange,
            bits: 0,
        }
    }
}

impl_bit_setters!(Delete, bit_flag::delete:
    set_if_unused => IF_UNUSED,
    set_no_wait => NO_WAIT
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeleteOk;
