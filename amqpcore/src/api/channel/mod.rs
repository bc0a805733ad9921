//! AMQP channel and its operations.
//!
//! A channel sends its synchronous methods one at a time: a method is written
//! only once the reply of the previous one arrived, so replies resolve the
//! pending results in the order the operations were called. Publishes queued
//! behind a synchronous method keep their place in the queue. While the broker
//! stopped the flow, a held publish also holds the methods queued after it,
//! `channel.close` included.
//!
//! # Example
//! ```rust,no_run
//! # use amqpcore::connection::Connection;
//! use amqpcore::channel::{QueueBindArguments, QueueDeclareArguments};
//!
//! # fn declare(connection: &Connection) -> amqpcore::error::Result<()> {
//! let channel = connection.open_channel()?;
//! channel
//!     .declare_queue(QueueDeclareArguments::new("capy-test").durable(true).finish())?
//!     .on_success(|ok| println!("queue {} declared", ok.queue()));
//! channel
//!     .bind_queue(QueueBindArguments::new("capy-test", "amq.topic", "echo.ping"))?
//!     .on_error(|err| eprintln!("bind failed: {}", err));
//! # Ok(())
//! # }
//! ```
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    fmt,
    rc::{Rc, Weak},
};

use amqp_wire::types::{AmqpChannelId, ShortStr};
use bytes::{Bytes, BytesMut};
#[cfg(feature = "traces")]
use tracing::{debug, trace, warn};

use crate::frame::{
    CancelOk, CloseChannel, CloseChannelOk, ContentBody, FlowOk, Frame, MethodHeader,
    OpenChannel, OpenChannelOk, FRAME_OVERHEAD, REPLY_SUCCESS,
};

use super::{
    connection::{Connection, Notification, Shared, Wire},
    deferred::{Consumer, Deferred},
    error::{Error, Result},
    message::ReturnedMessage,
};

mod basic;
mod dispatcher;
mod exchange;
mod queue;

pub use basic::*;
pub use exchange::*;
pub use queue::*;

use dispatcher::{Content, ContentAssembler, ContentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// `channel.open` queued or sent, waiting for `open-ok`.
    Opening,
    Open,
    /// `channel.close` queued or sent, waiting for `close-ok`.
    Closing,
    Closed,
}

/// Where the reply of a synchronous method goes.
pub(crate) enum Responder {
    Open,
    Unit(Deferred<()>),
    QueueDeclare(Deferred<QueueDeclareOk>),
    MessageCount(Deferred<u32>),
    Consume(Consumer),
    Cancel(Deferred<String>),
    Close(Deferred<()>),
}

impl Responder {
    fn fail(self, err: Error) {
        match self {
            Responder::Open => {}
            Responder::Unit(deferred) | Responder::Close(deferred) => deferred.fail(err),
            Responder::QueueDeclare(deferred) => deferred.fail(err),
            Responder::MessageCount(deferred) => deferred.fail(err),
            Responder::Consume(consumer) => consumer.deferred().fail(err),
            Responder::Cancel(deferred) => deferred.fail(err),
        }
    }
}

pub(crate) struct Pending {
    expected: &'static MethodHeader,
    responder: Responder,
}

/// Encoded methods waiting for their turn.
enum Outgoing {
    Request { bytes: Bytes, pending: Pending },
    // publish and content header frames, body frames are cut when sent
    Publish { preamble: Bytes, body: Bytes },
}

type ReturnHandler = Box<dyn FnMut(&ReturnedMessage)>;

pub(crate) struct ChannelCore {
    id: AmqpChannelId,
    state: ChannelState,
    flow_active: bool,
    outbox: VecDeque<Outgoing>,
    in_flight: Option<Pending>,
    consumers: HashMap<String, Consumer>,
    assembler: ContentAssembler,
    ready: Deferred<()>,
    failure: Option<Error>,
    on_error: Option<Box<dyn FnOnce(&Error)>>,
    on_return: Rc<RefCell<Option<ReturnHandler>>>,
    // our close crossed the broker's, the id stays reserved until its close-ok
    close_ok_awaited: Option<Deferred<()>>,
}

fn encode_frame(channel: AmqpChannelId, frame: Frame) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    frame
        .encode(channel, &mut buf)
        .map_err(|err| Error::ApplicationError(format!("failed to encode {}: {}", frame, err)))?;
    Ok(buf.freeze())
}

/// Names of exchanges, queues, routing keys and consumer tags are short strings.
pub(crate) fn short_str(what: &str, value: &str) -> Result<ShortStr> {
    ShortStr::try_from(value).map_err(|_| {
        Error::ApplicationError(format!("{} exceeds 255 bytes: {:.32}...", what, value))
    })
}

impl ChannelCore {
    pub(crate) fn new(id: AmqpChannelId) -> Result<Self> {
        let mut core = Self {
            id,
            state: ChannelState::Opening,
            flow_active: true,
            outbox: VecDeque::new(),
            in_flight: None,
            consumers: HashMap::new(),
            assembler: ContentAssembler::new(),
            ready: Deferred::new(),
            failure: None,
            on_error: None,
            on_return: Rc::new(RefCell::new(None)),
            close_ok_awaited: None,
        };
        let open = encode_frame(id, OpenChannel::default().into_frame())?;
        core.push(Outgoing::Request {
            bytes: open,
            pending: Pending {
                expected: OpenChannelOk::header(),
                responder: Responder::Open,
            },
        });
        Ok(core)
    }

    pub(crate) fn id(&self) -> AmqpChannelId {
        self.id
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    /// Closed and no reply is outstanding, the id can be reused.
    pub(crate) fn is_released(&self) -> bool {
        self.state == ChannelState::Closed && self.close_ok_awaited.is_none()
    }

    fn check_usable(&self) -> Result<()> {
        match self.state {
            ChannelState::Opening | ChannelState::Open => Ok(()),
            ChannelState::Closing | ChannelState::Closed => Err(Error::ApplicationError(format!(
                "channel {} is closing or closed",
                self.id
            ))),
        }
    }

    fn push(&mut self, outgoing: Outgoing) {
        if let Outgoing::Request { pending, .. } = &outgoing {
            if pending.expected == CloseChannelOk::header() {
                self.state = ChannelState::Closing;
            }
        }
        self.outbox.push_back(outgoing);
    }

    /// Move queued methods to the wire until a reply is awaited, or publishes
    /// are held by flow control.
    pub(crate) fn flush(&mut self, wire: &mut Wire) -> Result<()> {
        while self.in_flight.is_none() {
            match self.outbox.front() {
                None => break,
                Some(Outgoing::Publish { .. }) if !self.flow_active => break,
                Some(_) => {}
            }
            match self.outbox.pop_front() {
                Some(Outgoing::Request { bytes, pending }) => {
                    #[cfg(feature = "traces")]
                    trace!(
                        "channel {} sent request, awaiting {:?}",
                        self.id,
                        pending.expected
                    );
                    wire.buf.extend_from_slice(&bytes);
                    self.in_flight = Some(pending);
                }
                Some(Outgoing::Publish { preamble, body }) => {
                    wire.buf.extend_from_slice(&preamble);
                    self.send_body(body, wire)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn send_body(&self, mut body: Bytes, wire: &mut Wire) -> Result<()> {
        let chunk_size = match wire.frame_max as usize {
            0 => u32::MAX as usize - FRAME_OVERHEAD,
            max => max - FRAME_OVERHEAD,
        };
        while !body.is_empty() {
            let chunk = body.split_to(chunk_size.min(body.len()));
            wire.send(self.id, ContentBody::new(chunk).into_frame())?;
        }
        Ok(())
    }

    /// Handle a frame received on this channel. An error is fatal to the connection.
    pub(crate) fn handle_frame(&mut self, frame: Frame, wire: &mut Wire) -> Result<()> {
        if self.state == ChannelState::Closed {
            return self.handle_after_close(frame, wire);
        }
        if !self.assembler.is_idle()
            || matches!(frame, Frame::ContentHeader(_) | Frame::ContentBody(_))
        {
            return self.handle_content(frame, wire);
        }
        match frame {
            Frame::Deliver(_, deliver) => self.assembler.start(ContentMethod::Deliver(deliver)),
            Frame::Return(_, ret) => self.assembler.start(ContentMethod::Return(ret)),
            Frame::Flow(_, flow) => {
                #[cfg(feature = "traces")]
                debug!("channel {} flow active: {}", self.id, flow.active);
                self.flow_active = flow.active;
                wire.send(self.id, FlowOk::new(flow.active).into_frame())
            }
            Frame::CloseChannel(_, close) => {
                wire.send(self.id, CloseChannelOk.into_frame())?;
                let crossing = match self.in_flight.take() {
                    Some(Pending {
                        responder: Responder::Close(deferred),
                        ..
                    }) => Some(deferred),
                    in_flight => {
                        self.in_flight = in_flight;
                        None
                    }
                };
                #[cfg(feature = "traces")]
                warn!(
                    "broker closed channel {}: {} {}",
                    self.id, close.reply_code, close.reply_text
                );
                let err = Error::BrokerError {
                    reply_code: close.reply_code,
                    reply_text: close.reply_text.into(),
                    class_id: close.class_id,
                    method_id: close.method_id,
                };
                self.fail(err, wire.notifications);
                self.close_ok_awaited = crossing;
                Ok(())
            }
            Frame::Cancel(_, cancel) => {
                let consumer_tag: String = cancel.consumer_tag.clone().into();
                match self.consumers.remove(&consumer_tag) {
                    Some(consumer) => {
                        #[cfg(feature = "traces")]
                        debug!("broker cancelled consumer {} on channel {}", consumer_tag, self.id);
                        consumer.deregister();
                        wire.notify(move || consumer.cancelled(&consumer_tag));
                    }
                    None => {
                        #[cfg(feature = "traces")]
                        warn!("broker cancelled unknown consumer {}", consumer_tag);
                    }
                }
                if cancel.no_wait {
                    Ok(())
                } else {
                    wire.send(self.id, CancelOk::new(cancel.consumer_tag).into_frame())
                }
            }
            frame => self.handle_reply(frame, wire),
        }
    }

    /// Only the close-ok of a close which crossed the broker's is expected.
    fn handle_after_close(&mut self, frame: Frame, wire: &mut Wire) -> Result<()> {
        match (frame, self.close_ok_awaited.take()) {
            (Frame::CloseChannelOk(..), Some(deferred)) => {
                #[cfg(feature = "traces")]
                debug!("channel {} is closed", self.id);
                wire.notify(move || deferred.resolve(Ok(())));
            }
            (_frame, awaited) => {
                #[cfg(feature = "traces")]
                trace!("drop {} on closed channel {}", _frame, self.id);
                self.close_ok_awaited = awaited;
            }
        }
        Ok(())
    }

    fn handle_content(&mut self, frame: Frame, wire: &mut Wire) -> Result<()> {
        let completed = match frame {
            Frame::ContentHeader(header) => self.assembler.header(header),
            Frame::ContentBody(body) => self.assembler.body(body),
            other => Err(Error::ProtocolError(format!(
                "{} while content is expected",
                other
            ))),
        };
        let content = match completed {
            Ok(Some(content)) => content,
            Ok(None) => return Ok(()),
            Err(Error::ProtocolError(msg)) => {
                return Err(Error::ProtocolError(format!("channel {}: {}", self.id, msg)))
            }
            Err(err) => return Err(err),
        };
        match content {
            Content::Delivery(message) => match self.consumers.get(message.consumer_tag()) {
                Some(consumer) => {
                    let consumer = consumer.clone();
                    wire.notify(move || consumer.deliver(&message));
                }
                None => {
                    #[cfg(feature = "traces")]
                    warn!(
                        "drop delivery {} for unknown consumer {} on channel {}",
                        message.delivery_tag(),
                        message.consumer_tag(),
                        self.id
                    );
                }
            },
            Content::Returned(returned) => {
                let handler = self.on_return.clone();
                wire.notify(move || {
                    let f = handler.borrow_mut().take();
                    match f {
                        Some(mut f) => {
                            f(&returned);
                            let mut slot = handler.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(f);
                            }
                        }
                        None => {
                            #[cfg(feature = "traces")]
                            warn!(
                                "message returned by broker: {} {}",
                                returned.reply_code(),
                                returned.reply_text()
                            );
                        }
                    }
                });
            }
        }
        Ok(())
    }

    fn handle_reply(&mut self, frame: Frame, wire: &mut Wire) -> Result<()> {
        let pending = match self.in_flight.take() {
            Some(pending) => pending,
            None => {
                return Err(Error::ProtocolError(format!(
                    "channel {}: unexpected {}",
                    self.id, frame
                )))
            }
        };
        if frame.method_header() != Some(pending.expected) {
            let msg = format!(
                "channel {}: expected reply {:?}, received {}",
                self.id, pending.expected, frame
            );
            self.in_flight = Some(pending);
            return Err(Error::ProtocolError(msg));
        }

        match (pending.responder, frame) {
            (Responder::Open, Frame::OpenChannelOk(..)) => {
                #[cfg(feature = "traces")]
                debug!("channel {} is open", self.id);
                self.state = match self.state {
                    ChannelState::Opening => ChannelState::Open,
                    state => state,
                };
                let ready = self.ready.clone();
                wire.notify(move || ready.resolve(Ok(())));
            }
            (Responder::Close(deferred), Frame::CloseChannelOk(..)) => {
                #[cfg(feature = "traces")]
                debug!("channel {} is closed", self.id);
                self.state = ChannelState::Closed;
                let err =
                    Error::ApplicationError(format!("channel {} closed by application", self.id));
                self.abandon(err, wire.notifications);
                wire.notify(move || deferred.resolve(Ok(())));
            }
            (Responder::QueueDeclare(deferred), Frame::DeclareQueueOk(_, ok)) => {
                let ok = QueueDeclareOk {
                    queue: ok.queue.into(),
                    message_count: ok.message_count,
                    consumer_count: ok.consumer_count,
                };
                wire.notify(move || deferred.resolve(Ok(ok)));
            }
            (Responder::MessageCount(deferred), Frame::PurgeQueueOk(_, ok)) => {
                wire.notify(move || deferred.resolve(Ok(ok.message_count)));
            }
            (Responder::MessageCount(deferred), Frame::DeleteQueueOk(_, ok)) => {
                wire.notify(move || deferred.resolve(Ok(ok.message_count)));
            }
            (Responder::Consume(consumer), Frame::ConsumeOk(_, ok)) => {
                let consumer_tag: String = ok.consumer_tag.into();
                self.consumers.insert(consumer_tag.clone(), consumer.clone());
                wire.notify(move || consumer.deferred().resolve(Ok(consumer_tag)));
            }
            (Responder::Cancel(deferred), Frame::CancelOk(_, ok)) => {
                let consumer_tag: String = ok.consumer_tag.into();
                if let Some(consumer) = self.consumers.remove(&consumer_tag) {
                    consumer.deregister();
                }
                wire.notify(move || deferred.resolve(Ok(consumer_tag)));
            }
            (Responder::Unit(deferred), _) => {
                wire.notify(move || deferred.resolve(Ok(())));
            }
            (responder, frame) => {
                let msg = format!("channel {}: unexpected reply {}", self.id, frame);
                let err = Error::ProtocolError(msg);
                let cause = err.clone();
                wire.notify(move || responder.fail(cause));
                return Err(err);
            }
        }
        Ok(())
    }

    /// Fail every pending result and deregister the consumers.
    fn abandon(&mut self, err: Error, notifications: &mut VecDeque<Notification>) {
        self.assembler.reset();
        let pendings: Vec<Pending> = self
            .in_flight
            .take()
            .into_iter()
            .chain(self.outbox.drain(..).filter_map(|outgoing| match outgoing {
                Outgoing::Request { pending, .. } => Some(pending),
                Outgoing::Publish { .. } => None,
            }))
            .collect();
        for pending in pendings {
            let err = err.clone();
            notifications.push_back(Notification::Callback(Box::new(move || {
                pending.responder.fail(err)
            })));
        }
        for (_, consumer) in self.consumers.drain() {
            consumer.deregister();
            let err = err.clone();
            notifications.push_back(Notification::Callback(Box::new(move || {
                consumer.deferred().fail(err)
            })));
        }
        let ready = self.ready.clone();
        notifications.push_back(Notification::Callback(Box::new(move || ready.fail(err))));
    }

    /// Close the channel on error, the error handler is notified after every
    /// pending result failed.
    pub(crate) fn fail(&mut self, err: Error, notifications: &mut VecDeque<Notification>) {
        if self.state == ChannelState::Closed {
            if let Some(deferred) = self.close_ok_awaited.take() {
                notifications.push_back(Notification::Callback(Box::new(move || {
                    deferred.fail(err)
                })));
            }
            return;
        }
        self.state = ChannelState::Closed;
        self.failure = Some(err.clone());
        self.abandon(err.clone(), notifications);
        if let Some(f) = self.on_error.take() {
            notifications.push_back(Notification::Callback(Box::new(move || f(&err))));
        }
    }
}

/////////////////////////////////////////////////////////////////////////////
/// Handle of an AMQP channel, clones refer to the same channel.
///
/// Operations can be called as soon as the channel is created, they are
/// queued until the channel is open. The handle does not keep the connection
/// alive, operations fail once every [`Connection`] handle is dropped.
#[derive(Clone)]
pub struct Channel {
    id: AmqpChannelId,
    core: Rc<RefCell<ChannelCore>>,
    connection: Weak<Shared>,
}

impl Channel {
    pub(crate) fn new(core: Rc<RefCell<ChannelCore>>, connection: Weak<Shared>) -> Self {
        let id = core.borrow().id();
        Self {
            id,
            core,
            connection,
        }
    }

    pub fn channel_id(&self) -> AmqpChannelId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.core.borrow().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// `false` while the broker asked to stop publishing on this channel.
    pub fn is_flow_active(&self) -> bool {
        self.core.borrow().flow_active
    }

    /// Register the handler run once the broker confirmed the channel is open.
    pub fn on_ready<F>(&self, f: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        let ready = self.core.borrow().ready.clone();
        ready.on_success(move |_| f());
        self
    }

    /// Register the handler run when the channel closes on error.
    ///
    /// Runs immediately if the channel already failed. Not run when the
    /// channel is closed by [`close`](Self::close).
    pub fn on_error<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Error) + 'static,
    {
        let failure = self.core.borrow().failure.clone();
        match failure {
            Some(err) => f(&err),
            None => self.core.borrow_mut().on_error = Some(Box::new(f)),
        }
        self
    }

    /// Register the handler run for each `mandatory` message returned by the broker.
    pub fn on_return<F>(&self, f: F) -> &Self
    where
        F: FnMut(&ReturnedMessage) + 'static,
    {
        let slot = self.core.borrow().on_return.clone();
        *slot.borrow_mut() = Some(Box::new(f));
        self
    }

    /// Close the channel gracefully.
    ///
    /// Operations called before are still performed, later ones fail
    /// synchronously. The id is released once the broker confirmed. Behind a
    /// publish held by flow control, `channel.close` is sent once the flow
    /// resumes.
    pub fn close(&self) -> Result<Deferred<()>> {
        let deferred = Deferred::new();
        let close = CloseChannel::new(REPLY_SUCCESS, "OK".try_into()?, 0, 0);
        self.request(
            close.into_frame(),
            CloseChannelOk::header(),
            Responder::Close(deferred.clone()),
        )?;
        Ok(deferred)
    }

    fn shared(&self) -> Result<Rc<Shared>> {
        self.connection.upgrade().ok_or_else(|| {
            Error::ApplicationError(format!("connection of channel {} is dropped", self.id))
        })
    }

    /// Queue a synchronous method, its reply goes to `responder`.
    fn request(
        &self,
        frame: Frame,
        expected: &'static MethodHeader,
        responder: Responder,
    ) -> Result<()> {
        let bytes = encode_frame(self.id, frame)?;
        self.enqueue(Outgoing::Request {
            bytes,
            pending: Pending {
                expected,
                responder,
            },
        })
    }

    fn enqueue(&self, outgoing: Outgoing) -> Result<()> {
        let shared = self.shared()?;
        {
            let mut connection = shared.core.borrow_mut();
            connection.check_usable()?;
            let flushed = {
                let mut channel = self.core.borrow_mut();
                channel.check_usable()?;
                channel.push(outgoing);
                connection.flush_channel(&mut channel)
            };
            if let Err(err) = flushed {
                connection.teardown(err, true);
            }
            connection.update_interest();
        }
        Connection::from_shared(shared).dispatch();
        Ok(())
    }

    /// Send a method which is not queued behind pending requests, e.g. `basic.ack`.
    ///
    /// Deliveries keep arriving until `close-ok`, they can be acked while closing.
    fn send_now(&self, frame: Frame) -> Result<()> {
        let shared = self.shared()?;
        let mut connection = shared.core.borrow_mut();
        if !matches!(
            self.core.borrow().state,
            ChannelState::Open | ChannelState::Closing
        ) {
            return Err(Error::ApplicationError(format!(
                "channel {} is not open",
                self.id
            )));
        }
        connection.check_usable()?;
        connection
            .send_frame(self.id, frame)
            .map_err(|err| Error::ApplicationError(err.to_string()))?;
        connection.update_interest();
        Ok(())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.id)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
