use std::time::{Duration, Instant};

use amqpcore::{
    channel::QueueDeclareArguments,
    connection::ConnectionState,
    error::Error,
    frame::{Blocked, Close, CloseOk, ContentBody, Frame, HeartBeat, Start, Unblocked},
    transport::Interest,
};
mod common;
use common::{build_conn_args, encode, recorder, server_properties, Event, TestBroker};

#[test]
fn test_handshake() {
    common::setup_logging();
    let broker = TestBroker::connected(2047, 131072, 0);

    assert_eq!(vec![Event::Connected], broker.events());
    assert!(broker.connection.is_open());
    assert_eq!(2047, broker.connection.channel_max());
    assert_eq!(131072, broker.connection.frame_max());
    // broker disabled heartbeats, the client proposal wins
    assert_eq!(60, broker.connection.heartbeat());
    assert_eq!(Some(Duration::from_secs(30)), broker.socket.borrow().timer);
    assert_eq!(Interest::READABLE, broker.socket.borrow().interest);

    let properties = broker.connection.server_properties().unwrap();
    assert_eq!("RabbitMQ", properties.product());
    assert!(properties.capabilities().consumer_cancel_notify());
}

#[test]
fn test_tune_negotiation() {
    common::setup_logging();
    let broker = TestBroker::new(build_conn_args().channel_max(0).frame_max(0).finish());
    broker.handshake(100, 2048, 10);

    assert_eq!(100, broker.connection.channel_max());
    // raised to the protocol minimum
    assert_eq!(4096, broker.connection.frame_max());
    assert_eq!(10, broker.connection.heartbeat());
    assert_eq!(Some(Duration::from_secs(5)), broker.socket.borrow().timer);
}

#[test]
fn test_nothing_sent_before_start() {
    let broker = TestBroker::new(build_conn_args());
    let channel = broker.connection.open_channel().unwrap();
    assert!(broker.take_written().is_empty());
    assert_eq!(ConnectionState::Connecting, broker.connection.state());
    assert!(!channel.is_open());

    // queued channel open goes out once the connection is open
    broker.handshake(2047, 131072, 0);
    let frames = broker.frames();
    assert_eq!(1, frames.len());
    assert!(matches!(frames[0], (1, Frame::OpenChannel(..))));
}

#[test]
fn test_byte_at_a_time_handshake() {
    common::setup_logging();
    let broker = TestBroker::new(build_conn_args());
    broker.connection.start();
    broker.take_written();

    let start = encode(
        0,
        Start::new(
            server_properties(),
            "PLAIN".try_into().unwrap(),
            "en_US".try_into().unwrap(),
        )
        .into_frame(),
    );
    for byte in &start[..start.len() - 1] {
        assert_eq!(1, broker.connection.feed(std::slice::from_ref(byte)));
        assert!(broker.take_written().is_empty());
    }
    broker.connection.feed(&start[start.len() - 1..]);
    assert!(matches!(broker.frame(), (0, Frame::StartOk(..))));
}

#[test]
fn test_client_close_handshake() {
    common::setup_logging();
    let broker = TestBroker::connected(2047, 131072, 0);
    let closed = recorder();

    let result = broker.connection.close().unwrap();
    {
        let closed = closed.clone();
        result.on_success(move |_| closed.borrow_mut().push(()));
    }
    match broker.frame() {
        (0, Frame::Close(_, close)) => assert_eq!(200, close.reply_code),
        other => panic!("expected close, got {:?}", other),
    }
    assert_eq!(ConnectionState::Closing, broker.connection.state());
    assert!(broker.connection.open_channel().is_err());

    // frames other than close-ok are discarded while closing
    broker.send(0, HeartBeat.into_frame());
    assert!(closed.borrow().is_empty());

    broker.send(0, CloseOk.into_frame());
    assert_eq!(1, closed.borrow().len());
    assert_eq!(ConnectionState::Closed, broker.connection.state());
    assert!(broker.socket.borrow().closed);
    assert_eq!(
        vec![Event::Connected, Event::Heartbeat, Event::Closed],
        broker.events()
    );
}

#[test]
fn test_broker_close_with_error() {
    common::setup_logging();
    let broker = TestBroker::connected(2047, 131072, 0);
    let channel = broker.open_channel();
    let errors = recorder();
    {
        let errors = errors.clone();
        channel
            .declare_queue(QueueDeclareArguments::new("q1"))
            .unwrap()
            .on_error(move |err| errors.borrow_mut().push(err.clone()));
    }
    broker.frames();

    broker.send(
        0,
        Close::new(320, "CONNECTION_FORCED".try_into().unwrap(), 0, 0).into_frame(),
    );
    let expected = Error::BrokerError {
        reply_code: 320,
        reply_text: "CONNECTION_FORCED".to_owned(),
        class_id: 0,
        method_id: 0,
    };
    // close-ok is written before the transport is closed
    let written = std::mem::take(&mut broker.socket.borrow_mut().written);
    assert_eq!(encode(0, CloseOk.into_frame()), written);
    assert!(broker.socket.borrow().closed);

    assert_eq!(vec![expected.clone()], *errors.borrow());
    assert_eq!(
        vec![Event::Connected, Event::Error(expected), Event::Closed],
        broker.events()
    );
    assert!(!channel.is_open());
}

#[test]
fn test_broker_close_without_error() {
    let broker = TestBroker::connected(2047, 131072, 0);
    broker.send(
        0,
        Close::new(200, "bye".try_into().unwrap(), 0, 0).into_frame(),
    );
    assert_eq!(vec![Event::Connected, Event::Closed], broker.events());
}

#[test]
fn test_close_before_handshake() {
    let broker = TestBroker::new(build_conn_args());
    let channel = broker.connection.open_channel().unwrap();
    let channel_errors = recorder();
    {
        let channel_errors = channel_errors.clone();
        channel.on_error(move |err| channel_errors.borrow_mut().push(err.clone()));
    }
    let done = recorder();
    {
        let done = done.clone();
        broker
            .connection
            .close()
            .unwrap()
            .on_success(move |_| done.borrow_mut().push(()));
    }
    assert_eq!(1, done.borrow().len());
    assert_eq!(1, channel_errors.borrow().len());
    assert_eq!(vec![Event::Closed], broker.events());
    assert!(broker.connection.close().is_err());
}

#[test]
fn test_heartbeat_timeout() {
    common::setup_logging();
    let broker = TestBroker::connected(2047, 131072, 1);
    assert_eq!(1, broker.connection.heartbeat());
    let channel = broker.open_channel();
    let errors = recorder();
    {
        let errors = errors.clone();
        channel
            .declare_queue(QueueDeclareArguments::new("q1").durable(true).finish())
            .unwrap()
            .on_error(move |err| errors.borrow_mut().push(err.clone()));
    }
    broker.frames();

    let t0 = Instant::now();
    broker.connection.on_timer(t0);
    broker.connection.on_timer(t0 + Duration::from_millis(1000));
    // idle for one interval, a heartbeat is sent
    assert_eq!(vec![(0, HeartBeat.into_frame())], broker.frames());
    assert!(broker.connection.is_open());

    broker.connection.on_timer(t0 + Duration::from_millis(2500));
    assert_eq!(ConnectionState::Closed, broker.connection.state());
    assert_eq!(1, errors.borrow().len());
    assert!(matches!(errors.borrow()[0], Error::TransportError(_)));
    let events = broker.events();
    assert!(matches!(events[events.len() - 2], Event::Error(Error::TransportError(_))));
    assert_eq!(Some(&Event::Closed), events.last());
    assert!(broker.socket.borrow().timer.is_none());
}

#[test]
fn test_heartbeat_timeout_counts_from_arrival() {
    let broker = TestBroker::connected(2047, 131072, 1);
    broker.frames();

    let t0 = Instant::now();
    broker.connection.on_timer(t0);
    // last bytes arrive between the first two ticks
    broker.send(0, HeartBeat.into_frame());
    for ms in [500, 1000, 1500, 2000] {
        broker.connection.on_timer(t0 + Duration::from_millis(ms));
        assert!(broker.connection.is_open());
    }
    broker.connection.on_timer(t0 + Duration::from_millis(2500));
    assert_eq!(ConnectionState::Closed, broker.connection.state());
}

#[test]
fn test_heartbeat_keeps_connection_alive() {
    let broker = TestBroker::connected(2047, 131072, 2);
    broker.frames();

    let t0 = Instant::now();
    broker.connection.on_timer(t0);
    broker.send(0, HeartBeat.into_frame());
    broker.connection.on_timer(t0 + Duration::from_secs(3));
    broker.send(0, HeartBeat.into_frame());
    broker.connection.on_timer(t0 + Duration::from_secs(6));
    assert!(broker.connection.is_open());
    assert_eq!(
        vec![Event::Connected, Event::Heartbeat, Event::Heartbeat],
        broker.events()
    );
}

#[test]
fn test_protocol_version_rejected() {
    let broker = TestBroker::new(build_conn_args());
    broker.connection.start();
    broker.take_written();

    broker.connection.feed(b"AMQP\x01\x01\x00\x0a");
    let events = broker.events();
    assert!(matches!(events[0], Event::Error(Error::ProtocolError(_))));
    assert_eq!(Event::Closed, events[1]);
    assert_eq!(0, broker.connection.feed(b"more"));
}

#[test]
fn test_unsupported_mechanism() {
    let broker = TestBroker::new(build_conn_args());
    broker.connection.start();
    broker.take_written();
    broker.send(
        0,
        Start::new(
            server_properties(),
            "EXTERNAL".try_into().unwrap(),
            "en_US".try_into().unwrap(),
        )
        .into_frame(),
    );
    assert!(matches!(
        broker.events()[0],
        Event::Error(Error::ProtocolError(_))
    ));
    assert_eq!(ConnectionState::Closed, broker.connection.state());
}

#[test]
fn test_channel_frame_during_handshake() {
    let broker = TestBroker::new(build_conn_args());
    broker.connection.start();
    broker.send(1, ContentBody::new(b"x".to_vec()).into_frame());
    assert!(matches!(
        broker.events()[0],
        Event::Error(Error::ProtocolError(_))
    ));
}

#[test]
fn test_corrupted_frame() {
    let broker = TestBroker::connected(2047, 131072, 0);
    let mut bytes = encode(0, HeartBeat.into_frame());
    *bytes.last_mut().unwrap() = 0;
    broker.connection.feed(&bytes);
    assert!(matches!(
        broker.events()[1],
        Event::Error(Error::ProtocolError(_))
    ));
    assert_eq!(Event::Closed, broker.events()[2]);
}

#[test]
fn test_frame_larger_than_frame_max() {
    let broker = TestBroker::connected(2047, 4096, 0);
    let bytes = encode(1, ContentBody::new(vec![0u8; 5000]).into_frame());
    // rejected from the frame header, before the payload arrives
    broker.connection.feed(&bytes[..16]);
    assert!(matches!(
        broker.events()[1],
        Event::Error(Error::ProtocolError(_))
    ));
}

#[test]
fn test_transport_closed() {
    let broker = TestBroker::connected(2047, 131072, 0);
    let channel = broker.open_channel();
    broker.connection.on_transport_closed();
    assert!(matches!(
        broker.events()[1],
        Event::Error(Error::TransportError(_))
    ));
    assert_eq!(Event::Closed, broker.events()[2]);
    assert!(channel.declare_queue(QueueDeclareArguments::new("q1")).is_err());
    assert_eq!(0, broker.connection.feed(&encode(0, HeartBeat.into_frame())));
}

#[test]
fn test_write_interest_follows_pending_bytes() {
    let broker = TestBroker::connected(2047, 131072, 0);
    broker.socket.borrow_mut().would_block = true;
    let channel = broker.connection.open_channel().unwrap();
    assert_eq!(Interest::READ_WRITE, broker.socket.borrow().interest);
    assert!(broker.take_written().is_empty());

    broker.socket.borrow_mut().would_block = false;
    let frames = broker.frames();
    assert!(matches!(frames[0], (id, Frame::OpenChannel(..)) if id == channel.channel_id()));
    assert_eq!(Interest::READABLE, broker.socket.borrow().interest);
}

#[test]
fn test_blocked_and_unblocked() {
    let broker = TestBroker::connected(2047, 131072, 0);
    broker.send(0, Blocked::new("low on memory".try_into().unwrap()).into_frame());
    assert!(broker.connection.is_blocked());
    broker.send(0, Unblocked.into_frame());
    assert!(!broker.connection.is_blocked());
    assert_eq!(
        vec![
            Event::Connected,
            Event::Blocked("low on memory".to_owned()),
            Event::Unblocked
        ],
        broker.events()
    );
}
