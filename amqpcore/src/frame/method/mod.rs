use amqp_wire::types::{AmqpClassId, AmqpMethodId};
use serde::{Deserialize, Serialize};

mod basic;
mod channel;
mod connection;
mod exchange;
mod queue;

pub use basic::*;
pub use channel::*;
pub use connection::*;
pub use exchange::*;
pub use queue::*;

/// Class id and method id which start every method frame payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MethodHeader {
    class_id: AmqpClassId,
    method_id: AmqpMethodId,
}

impl MethodHeader {
    pub const fn new(class_id: AmqpClassId, method_id: AmqpMethodId) -> Self {
        Self {
            class_id,
            method_id,
        }
    }

    pub fn class_id(&self) -> AmqpClassId {
        self.class_id
    }

    pub fn method_id(&self) -> AmqpMethodId {
        self.method_id
    }
}

// Consecutive bit arguments are packed into the `bits` octet, low bit first.
macro_rules! impl_bit_setters {
    ($method:ident, $module:ident::$flags:ident : $($setter:ident => $flag:ident),+) => {
        impl $method {
            $(
                pub fn $setter(&mut self, value: bool) {
                    if value {
                        self.bits |= $module::$flags::$flag;
                    } else {
                        self.bits &= !$module::$flags::$flag;
                    }
                }
            )+
        }
    };
}
pub(crate) use impl_bit_setters;
