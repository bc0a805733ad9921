use amqp_wire::types::{AmqpChannelId, Octect};

pub use amqp_wire::constants::*;

/// Frame header: type (1) + channel (2) + payload size (4).
pub const FRAME_HEADER_SIZE: usize = 7;
/// Bytes a frame adds around its payload: header plus the frame end octet.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + 1;
/// Method header: class id (2) + method id (2).
pub const METHOD_HEADER_SIZE: usize = 4;

pub const CONNECTION_CHANNEL: AmqpChannelId = 0;

/// Smallest frame size a peer may negotiate.
pub const FRAME_MIN_SIZE: u32 = 4096;

pub const DELIVERY_MODE_TRANSIENT: Octect = 1;
pub const DELIVERY_MODE_PERSISTENT: Octect = 2;

pub const CLASS_BASIC: u16 = 60;
