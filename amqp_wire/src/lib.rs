//! Serde data format for the primitive and domain types of AMQP 0-9-1.
//!
//! Integers are big-endian. Strings and byte arrays take their length from the
//! integer decoded right before them, so [`types::ShortStr`] and
//! [`types::LongStr`] carry a `u8` and `u32` prefix respectively.
//! Sequences and maps (field arrays and field tables) are prefixed with their
//! size in bytes as `u32`.
mod de;
mod error;
mod ser;

pub mod constants;
pub mod types;

pub use de::{from_bytes, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_buffer, to_bytes, Serializer};
