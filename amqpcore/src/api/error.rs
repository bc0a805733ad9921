//! Error type reported by the engine.

use crate::frame;
use amqp_wire::types::{AmqpClassId, AmqpMethodId, AmqpReplyCode};

use std::fmt;

/// A list of errors can be reported by the engine.
///
/// Errors reach the application through the synchronous `Err` of an operation,
/// the `on_error` slot of a [`Deferred`](crate::Deferred) or channel, or the
/// [`ConnectionHandler`](crate::ConnectionHandler).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Transport closed or failed, or the peer went silent. Fatal to the connection.
    TransportError(String),
    /// Malformed frame, failed handshake or unexpected frame. Fatal to the connection.
    ProtocolError(String),
    /// Broker closed a channel, or the connection with an error code.
    BrokerError {
        reply_code: AmqpReplyCode,
        reply_text: String,
        class_id: AmqpClassId,
        method_id: AmqpMethodId,
    },
    /// Incorrect usage, or pending operation abandoned by the application.
    ApplicationError(String),
}

impl Error {
    /// `true` if the error ends the whole connection rather than one channel.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::TransportError(_) | Error::ProtocolError(_))
    }
}

impl From<frame::Error> for Error {
    fn from(err: frame::Error) -> Self {
        Self::ProtocolError(err.to_string())
    }
}

impl From<amqp_wire::Error> for Error {
    fn from(err: amqp_wire::Error) -> Self {
        Self::ProtocolError(err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TransportError(msg) => write!(f, "AMQP transport error: {}", msg),
            Error::ProtocolError(msg) => write!(f, "AMQP protocol error: {}", msg),
            Error::BrokerError {
                reply_code,
                reply_text,
                class_id,
                method_id,
            } => write!(
                f,
                "AMQP broker error: {} {}, class id {}, method id {}",
                reply_code, reply_text, class_id, method_id
            ),
            Error::ApplicationError(msg) => write!(f, "AMQP application error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
