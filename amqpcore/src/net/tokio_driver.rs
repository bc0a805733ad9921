//! Drive a [`Connection`] over a tokio stream.
//!
//! The engine is single threaded, run the driver on a current thread runtime
//! or inside a [`tokio::task::LocalSet`].
use std::{cell::RefCell, rc::Rc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    sync::Notify,
    time::{self, Interval, MissedTickBehavior},
};
#[cfg(feature = "traces")]
use tracing::{debug, error, info};

use super::transport::{Interest, Transport};
use crate::api::{
    callbacks::ConnectionHandler,
    connection::{Connection, ConnectionState, OpenConnectionArguments},
    error::{Error, Result},
};

const READ_BUFFER_SIZE: usize = 64 * 1024;

struct DriverState {
    interest: Interest,
    heartbeat_interval: Option<Duration>,
    // bytes accepted from the engine, written by the run loop
    staging: Vec<u8>,
    closed: bool,
}

struct DriverTransport {
    state: Rc<RefCell<DriverState>>,
    wakeup: Rc<Notify>,
}

impl Transport for DriverTransport {
    fn monitor(&mut self, interest: Interest) {
        self.state.borrow_mut().interest = interest;
        if interest.writable {
            self.wakeup.notify_one();
        }
    }

    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.state.borrow_mut().staging.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn schedule(&mut self, interval: Duration) {
        self.state.borrow_mut().heartbeat_interval = Some(interval);
        self.wakeup.notify_one();
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.heartbeat_interval = None;
        self.wakeup.notify_one();
    }
}

/// Owns the stream of a [`Connection`] and runs its I/O loop.
///
/// # Example
/// ```rust,no_run
/// use amqpcore::{
///     callbacks::DefaultConnectionHandler, connection::OpenConnectionArguments, net::TokioDriver,
/// };
///
/// # async fn run() -> amqpcore::error::Result<()> {
/// let args = OpenConnectionArguments::new("localhost", 5672, "user", "bitnami");
/// let driver = TokioDriver::connect(args, DefaultConnectionHandler).await?;
/// let connection = driver.connection().clone();
/// let channel = connection.open_channel()?;
/// channel.on_ready(|| println!("channel is open"));
/// driver.run().await
/// # }
/// ```
pub struct TokioDriver<S> {
    stream: S,
    connection: Connection,
    state: Rc<RefCell<DriverState>>,
    wakeup: Rc<Notify>,
}

impl TokioDriver<TcpStream> {
    /// Open a TCP connection to `args` host and port.
    pub async fn connect<H>(args: OpenConnectionArguments, handler: H) -> Result<Self>
    where
        H: ConnectionHandler + 'static,
    {
        let stream = TcpStream::connect((args.get_host(), args.get_port()))
            .await
            .map_err(|err| Error::TransportError(err.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|err| Error::TransportError(err.to_string()))?;
        #[cfg(feature = "traces")]
        info!("connected to {}:{}", args.get_host(), args.get_port());
        Ok(Self::new(stream, args, handler))
    }
}

impl<S> TokioDriver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream. Nothing is sent before [`run`](Self::run).
    pub fn new<H>(stream: S, args: OpenConnectionArguments, handler: H) -> Self
    where
        H: ConnectionHandler + 'static,
    {
        let state = Rc::new(RefCell::new(DriverState {
            interest: Interest::NONE,
            heartbeat_interval: None,
            staging: Vec::new(),
            closed: false,
        }));
        let wakeup = Rc::new(Notify::new());
        let transport = DriverTransport {
            state: state.clone(),
            wakeup: wakeup.clone(),
        };
        Self {
            stream,
            connection: Connection::new(args, transport, handler),
            state,
            wakeup,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Start the handshake and serve the connection until it is closed.
    ///
    /// Return the I/O error which ended the connection, if any. Errors
    /// reported by the broker reach the [`ConnectionHandler`] instead.
    pub async fn run(mut self) -> Result<()> {
        self.connection.start();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut heartbeat: Option<(Duration, Interval)> = None;
        let mut io_error = None;

        loop {
            if self.state.borrow().interest.writable {
                self.connection.on_writable();
            }
            let staging = std::mem::take(&mut self.state.borrow_mut().staging);
            if !staging.is_empty() {
                let written = match self.stream.write_all(&staging).await {
                    Ok(()) => self.stream.flush().await,
                    Err(err) => Err(err),
                };
                if let Err(err) = written {
                    #[cfg(feature = "traces")]
                    error!("failed to write to socket: {}", err);
                    io_error = Some(Error::TransportError(err.to_string()));
                    self.connection.on_transport_error(&err.to_string());
                    break;
                }
            }
            if self.state.borrow().closed || self.connection.state() == ConnectionState::Closed {
                break;
            }

            let period = self.state.borrow().heartbeat_interval;
            if heartbeat.as_ref().map(|(current, _)| *current) != period {
                heartbeat = period.map(|period| {
                    let mut interval = time::interval_at(time::Instant::now() + period, period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    (period, interval)
                });
            }

            tokio::select! {
                read = self.stream.read(&mut buf) => match read {
                    Ok(0) => {
                        #[cfg(feature = "traces")]
                        info!("socket closed by peer");
                        io_error = Some(Error::TransportError("connection closed by peer".to_owned()));
                        self.connection.on_transport_closed();
                    }
                    Ok(n) => {
                        self.connection.feed(&buf[..n]);
                    }
                    Err(err) => {
                        #[cfg(feature = "traces")]
                        error!("failed to read from socket: {}", err);
                        io_error = Some(Error::TransportError(err.to_string()));
                        self.connection.on_transport_error(&err.to_string());
                    }
                },
                _ = tick(&mut heartbeat) => {
                    self.connection.on_timer(std::time::Instant::now());
                }
                _ = self.wakeup.notified() => {}
            }
        }

        let _ = self.stream.shutdown().await;
        #[cfg(feature = "traces")]
        debug!("driver of {} stopped", self.connection);
        match io_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn tick(heartbeat: &mut Option<(Duration, Interval)>) {
    match heartbeat {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
