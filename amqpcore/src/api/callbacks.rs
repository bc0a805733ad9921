use super::{connection::Connection, error::Error};
#[cfg(feature = "traces")]
use tracing::{debug, error, info, warn};

/////////////////////////////////////////////////////////////////////////////
/// Connection level notifications.
///
/// All methods have a no-op default, implement the ones of interest. The
/// handler may call any operation on the connection or its channels.
pub trait ConnectionHandler {
    /// Handshake completed, channels opened meanwhile start flowing.
    fn on_connected(&mut self, connection: &Connection) {
        let _ = connection;
    }

    /// Fatal error, or the broker closed the connection with an error code.
    /// Always followed by [`on_closed`](Self::on_closed).
    fn on_error(&mut self, connection: &Connection, error: &Error) {
        let _ = (connection, error);
    }

    /// Connection is closed, no more notifications follow.
    fn on_closed(&mut self, connection: &Connection) {
        let _ = connection;
    }

    /// Heartbeat frame received from the broker.
    fn on_heartbeat(&mut self, connection: &Connection) {
        let _ = connection;
    }

    /// Broker stopped reading from the connection, e.g. on a memory alarm.
    fn on_blocked(&mut self, connection: &Connection, reason: &str) {
        let _ = (connection, reason);
    }

    fn on_unblocked(&mut self, connection: &Connection) {
        let _ = connection;
    }
}

/// Handler which only logs the notifications.
pub struct DefaultConnectionHandler;

impl ConnectionHandler for DefaultConnectionHandler {
    fn on_connected(&mut self, _connection: &Connection) {
        #[cfg(feature = "traces")]
        info!("connected: {}", _connection);
    }

    fn on_error(&mut self, _connection: &Connection, _error: &Error) {
        #[cfg(feature = "traces")]
        error!("{}: {}", _connection, _error);
    }

    fn on_closed(&mut self, _connection: &Connection) {
        #[cfg(feature = "traces")]
        info!("closed: {}", _connection);
    }

    fn on_heartbeat(&mut self, _connection: &Connection) {
        #[cfg(feature = "traces")]
        debug!("heartbeat received on {}", _connection);
    }

    fn on_blocked(&mut self, _connection: &Connection, _reason: &str) {
        #[cfg(feature = "traces")]
        warn!("blocked by broker: {}, reason: {}", _connection, _reason);
    }

    fn on_unblocked(&mut self, _connection: &Connection) {
        #[cfg(feature = "traces")]
        info!("unblocked by broker: {}", _connection);
    }
}
