use amqp_wire::types::{AmqpClassId, AmqpMethodId, LongUint, Octect};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Frame end octet is not `0xCE`, or payload is malformed.
    Corrupted,
    UnknownFrameType(Octect),
    UnknownMethod(AmqpClassId, AmqpMethodId),
    FrameTooLarge { size: usize, max: LongUint },
    SerdeError(String),
}

impl From<amqp_wire::Error> for Error {
    fn from(err: amqp_wire::Error) -> Self {
        Self::SerdeError(err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Corrupted => f.write_str("corrupted frame"),
            Error::UnknownFrameType(typ) => write!(f, "unknown frame type: {}", typ),
            Error::UnknownMethod(class_id, method_id) => {
                write!(f, "unknown method: class {}, method {}", class_id, method_id)
            }
            Error::FrameTooLarge { size, max } => {
                write!(f, "frame of {} bytes exceeds frame max {}", size, max)
            }
            Error::SerdeError(msg) => write!(f, "serde error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
