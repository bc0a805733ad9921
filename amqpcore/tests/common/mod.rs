#![allow(dead_code)]
use std::{cell::RefCell, io, rc::Rc, time::Duration};

use amqp_wire::types::{AmqpChannelId, FieldTable, FieldValue};
use amqpcore::{
    callbacks::ConnectionHandler,
    channel::Channel,
    connection::{Connection, OpenConnectionArguments},
    error::Error,
    frame::{
        Frame, OpenChannel, OpenChannelOk, OpenOk, ProtocolHeader, Start, StartOk, Tune, TuneOk,
    },
    transport::{Interest, Transport},
};
use bytes::BytesMut;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// construct a subscriber that prints formatted traces to stdout
pub fn setup_logging() {
    // global subscriber with log level according to RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

pub fn build_conn_args() -> OpenConnectionArguments {
    OpenConnectionArguments::new("localhost", 5672, "user", "bitnami")
}

/////////////////////////////////////////////////////////////////////////////
/// Socket side of the mock transport.
pub struct MockSocket {
    pub written: Vec<u8>,
    pub interest: Interest,
    pub timer: Option<Duration>,
    pub closed: bool,
    /// Refuse writes with `WouldBlock`.
    pub would_block: bool,
}

#[derive(Clone)]
pub struct MockTransport(pub Rc<RefCell<MockSocket>>);

impl MockTransport {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(MockSocket {
            written: Vec::new(),
            interest: Interest::NONE,
            timer: None,
            closed: false,
            would_block: false,
        })))
    }
}

impl Transport for MockTransport {
    fn monitor(&mut self, interest: Interest) {
        self.0.borrow_mut().interest = interest;
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut socket = self.0.borrow_mut();
        if socket.would_block || socket.closed {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        socket.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn schedule(&mut self, interval: Duration) {
        self.0.borrow_mut().timer = Some(interval);
    }

    fn close(&mut self) {
        let mut socket = self.0.borrow_mut();
        socket.closed = true;
        socket.timer = None;
    }
}

/////////////////////////////////////////////////////////////////////////////
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    Error(Error),
    Closed,
    Heartbeat,
    Blocked(String),
    Unblocked,
}

#[derive(Clone, Default)]
pub struct RecordingHandler(pub Rc<RefCell<Vec<Event>>>);

impl ConnectionHandler for RecordingHandler {
    fn on_connected(&mut self, _connection: &Connection) {
        self.0.borrow_mut().push(Event::Connected);
    }

    fn on_error(&mut self, _connection: &Connection, error: &Error) {
        self.0.borrow_mut().push(Event::Error(error.clone()));
    }

    fn on_closed(&mut self, _connection: &Connection) {
        self.0.borrow_mut().push(Event::Closed);
    }

    fn on_heartbeat(&mut self, _connection: &Connection) {
        self.0.borrow_mut().push(Event::Heartbeat);
    }

    fn on_blocked(&mut self, _connection: &Connection, reason: &str) {
        self.0.borrow_mut().push(Event::Blocked(reason.to_owned()));
    }

    fn on_unblocked(&mut self, _connection: &Connection) {
        self.0.borrow_mut().push(Event::Unblocked);
    }
}

/// Shared record of callback invocations.
pub fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn encode(channel: AmqpChannelId, frame: Frame) -> Vec<u8> {
    let mut buf = BytesMut::new();
    frame.encode(channel, &mut buf).unwrap();
    buf.to_vec()
}

pub fn server_properties() -> FieldTable {
    let mut capabilities = FieldTable::new();
    capabilities.insert("consumer_cancel_notify".try_into().unwrap(), true.into());
    capabilities.insert("basic.nack".try_into().unwrap(), true.into());
    let mut properties = FieldTable::new();
    properties.insert("capabilities".try_into().unwrap(), capabilities.into());
    properties.insert(
        "product".try_into().unwrap(),
        FieldValue::S("RabbitMQ".try_into().unwrap()),
    );
    properties.insert(
        "version".try_into().unwrap(),
        FieldValue::S("3.12.0".try_into().unwrap()),
    );
    properties
}

/////////////////////////////////////////////////////////////////////////////
/// Scripted broker: feeds frames to the connection and decodes what it writes.
pub struct TestBroker {
    pub connection: Connection,
    pub socket: Rc<RefCell<MockSocket>>,
    pub events: Rc<RefCell<Vec<Event>>>,
}

impl TestBroker {
    pub fn new(args: OpenConnectionArguments) -> Self {
        let transport = MockTransport::new();
        let socket = transport.0.clone();
        let handler = RecordingHandler::default();
        let events = handler.0.clone();
        Self {
            connection: Connection::new(args, transport, handler),
            socket,
            events,
        }
    }

    /// Broker connected and opened with the given tuning.
    pub fn connected(channel_max: u16, frame_max: u32, heartbeat: u16) -> Self {
        let broker = Self::new(build_conn_args());
        broker.handshake(channel_max, frame_max, heartbeat);
        broker
    }

    /// Let the connection write and return everything it wrote so far.
    pub fn take_written(&self) -> Vec<u8> {
        self.connection.on_writable();
        std::mem::take(&mut self.socket.borrow_mut().written)
    }

    /// Frames written by the connection since the last call.
    pub fn frames(&self) -> Vec<(AmqpChannelId, Frame)> {
        let bytes = self.take_written();
        let mut frames = vec![];
        let mut offset = 0;
        while offset < bytes.len() {
            let (consumed, channel, frame) = Frame::decode(&bytes[offset..])
                .unwrap()
                .expect("connection wrote a partial frame");
            offset += consumed;
            frames.push((channel, frame));
        }
        frames
    }

    /// The only frame written by the connection since the last call.
    pub fn frame(&self) -> (AmqpChannelId, Frame) {
        let mut frames = self.frames();
        assert_eq!(1, frames.len(), "expected one frame, got {:?}", frames);
        frames.remove(0)
    }

    pub fn send(&self, channel: AmqpChannelId, frame: Frame) {
        self.connection.feed(&encode(channel, frame));
    }

    pub fn handshake(&self, channel_max: u16, frame_max: u32, heartbeat: u16) {
        self.connection.start();
        assert_eq!(
            ProtocolHeader::default().as_bytes().to_vec(),
            self.take_written()
        );

        self.send(
            0,
            Start::new(
                server_properties(),
                "PLAIN AMQPLAIN".try_into().unwrap(),
                "en_US".try_into().unwrap(),
            )
            .into_frame(),
        );
        match self.frame() {
            (0, Frame::StartOk(_, start_ok)) => assert_start_ok(&start_ok),
            other => panic!("expected start-ok, got {:?}", other),
        }

        self.send(0, Tune::new(channel_max, frame_max, heartbeat).into_frame());
        let frames = self.frames();
        assert_eq!(2, frames.len(), "{:?}", frames);
        assert!(matches!(frames[0], (0, Frame::TuneOk(..))));
        assert!(matches!(frames[1], (0, Frame::Open(..))));

        self.send(0, OpenOk::default().into_frame());
    }

    /// Negotiated tuning the client replied with in `tune-ok`.
    pub fn tune_ok_of(frame: &Frame) -> TuneOk {
        match frame {
            Frame::TuneOk(_, tune_ok) => tune_ok.clone(),
            other => panic!("expected tune-ok, got {}", other),
        }
    }

    /// Open a channel and confirm it.
    pub fn open_channel(&self) -> Channel {
        let channel = self.connection.open_channel().unwrap();
        let id = channel.channel_id();
        assert_eq!(
            vec![(id, OpenChannel::default().into_frame())],
            self.frames()
        );
        self.send(id, OpenChannelOk::default().into_frame());
        assert!(channel.is_open());
        channel
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

fn assert_start_ok(start_ok: &StartOk) {
    assert_eq!("PLAIN", start_ok.mechanism.as_str());
    assert_eq!(b"\0user\0bitnami".to_vec(), Vec::<u8>::from(start_ok.response.clone()));
    assert_eq!("en_US", start_ok.locale.as_str());
}
