//! Boundary between the engine and the event loop which owns the socket.
//!
//! The engine never performs I/O itself. The event loop implements
//! [`Transport`] and reports events back through the entry points of
//! [`Connection`](crate::Connection): `start`, `feed`, `on_writable`,
//! `on_timer`, `on_transport_closed` and `on_transport_error`.
//! `Transport` methods must not call back into the connection.
use std::{io, time::Duration};

/// Readiness the engine wants to be notified of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub readable: bool,
    pub writable: bool,
}

impl Interest {
    pub const NONE: Interest = Interest {
        readable: false,
        writable: false,
    };
    pub const READABLE: Interest = Interest {
        readable: true,
        writable: false,
    };
    pub const READ_WRITE: Interest = Interest {
        readable: true,
        writable: true,
    };
}

pub trait Transport {
    /// Watch the socket for the given readiness, replacing the previous interest.
    fn monitor(&mut self, interest: Interest);

    /// Write as many bytes as possible without blocking.
    ///
    /// Return the number of bytes written, or `ErrorKind::WouldBlock` if none
    /// can be written now.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Arm a repeating timer calling `Connection::on_timer` every `interval`,
    /// replacing the previous one.
    fn schedule(&mut self, interval: Duration);

    /// Cancel watches and timer, and close the socket.
    fn close(&mut self);
}
