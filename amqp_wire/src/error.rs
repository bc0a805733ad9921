use serde::{de, ser};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Custom message raised by a `Serialize` or `Deserialize` implementation.
    Message(String),
    /// Input ended before the value was complete.
    Eof,
    /// Input has bytes left over after the value was decoded.
    Incomplete,
    /// A string or byte array was not preceded by its length.
    ExpectedLength,
    /// A declared length runs past the end of the input.
    Syntax,
    /// Field value tag is not part of the AMQP 0-9-1 (RabbitMQ) field type set.
    UnknownFieldType(u8),
    /// Content does not fit the size of its length prefix.
    Overflow,
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => f.write_str(msg),
            Error::Eof => f.write_str("unexpected end of input"),
            Error::Incomplete => f.write_str("trailing bytes after decoded value"),
            Error::ExpectedLength => f.write_str("missing length prefix"),
            Error::Syntax => f.write_str("length prefix exceeds input"),
            Error::UnknownFieldType(tag) => write!(f, "unknown field value type '{}'", tag),
            Error::Overflow => f.write_str("content exceeds its length prefix"),
        }
    }
}

impl std::error::Error for Error {}
