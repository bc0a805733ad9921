//! Reassembly of content frames into messages.
//!
//! `basic.deliver` and `basic.return` are followed by one content header and
//! as many body frames as needed to carry `body_size` bytes. No other frame
//! may interleave on the same channel.
use bytes::{Bytes, BytesMut};

use crate::{
    api::{
        error::{Error, Result},
        message::{Message, ReturnedMessage},
    },
    frame::{BasicProperties, ContentBody, ContentHeader, Deliver, Return, CLASS_BASIC},
};

pub(crate) enum ContentMethod {
    Deliver(Deliver),
    Return(Return),
}

pub(crate) enum Content {
    Delivery(Message),
    Returned(ReturnedMessage),
}

enum State {
    Idle,
    AwaitHeader(ContentMethod),
    AwaitBody {
        method: ContentMethod,
        properties: BasicProperties,
        body_size: usize,
        body: BytesMut,
    },
}

pub(crate) struct ContentAssembler {
    state: State,
}

fn unexpected(what: &str) -> Error {
    Error::ProtocolError(format!("unexpected {}", what))
}

impl ContentMethod {
    fn complete(self, properties: BasicProperties, body: Bytes) -> Content {
        match self {
            ContentMethod::Deliver(deliver) => Content::Delivery(Message {
                delivery_tag: deliver.delivery_tag,
                redelivered: deliver.redelivered,
                exchange: deliver.exchange.into(),
                routing_key: deliver.routing_key.into(),
                consumer_tag: deliver.consumer_tag.into(),
                properties,
                body,
            }),
            ContentMethod::Return(ret) => Content::Returned(ReturnedMessage {
                reply_code: ret.reply_code,
                reply_text: ret.reply_text.into(),
                exchange: ret.exchange.into(),
                routing_key: ret.routing_key.into(),
                properties,
                body,
            }),
        }
    }
}

impl ContentAssembler {
    pub(crate) fn new() -> Self {
        Self { state: State::Idle }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    pub(crate) fn reset(&mut self) {
        self.state = State::Idle;
    }

    pub(crate) fn start(&mut self, method: ContentMethod) -> Result<()> {
        if !self.is_idle() {
            return Err(unexpected("content method while content is in progress"));
        }
        self.state = State::AwaitHeader(method);
        Ok(())
    }

    pub(crate) fn header(&mut self, header: ContentHeader) -> Result<Option<Content>> {
        let method = match std::mem::replace(&mut self.state, State::Idle) {
            State::AwaitHeader(method) => method,
            _ => return Err(unexpected("content header")),
        };
        if header.common.class != CLASS_BASIC {
            return Err(Error::ProtocolError(format!(
                "content header of class {}",
                header.common.class
            )));
        }
        let body_size = usize::try_from(header.common.body_size).map_err(|_| {
            Error::ProtocolError(format!("body size {} too large", header.common.body_size))
        })?;
        if body_size == 0 {
            return Ok(Some(method.complete(header.basic_properties, Bytes::new())));
        }
        self.state = State::AwaitBody {
            method,
            properties: header.basic_properties,
            body_size,
            body: BytesMut::new(),
        };
        Ok(None)
    }

    pub(crate) fn body(&mut self, chunk: ContentBody) -> Result<Option<Content>> {
        let (body_size, received) = match &mut self.state {
            State::AwaitBody {
                body_size, body, ..
            } => {
                if body.len() + chunk.len() > *body_size {
                    let msg = format!(
                        "content body overflow, {} bytes expected, {} received",
                        body_size,
                        body.len() + chunk.len()
                    );
                    self.state = State::Idle;
                    return Err(Error::ProtocolError(msg));
                }
                body.extend_from_slice(chunk.as_ref());
                (*body_size, body.len())
            }
            _ => return Err(unexpected("content body")),
        };
        if received < body_size {
            return Ok(None);
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::AwaitBody {
                method,
                properties,
                body,
                ..
            } => Ok(Some(method.complete(properties, body.freeze()))),
            _ => Err(unexpected("content body")),
        }
    }
}
