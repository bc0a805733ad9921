//! Event-loop agnostic AMQP 0-9-1 client engine.
//!
//! The engine performs no I/O. It consumes bytes and timer ticks handed to it
//! by the event loop owning the socket, and produces bytes to write through
//! the [`Transport`](transport::Transport) the event loop implements.
//! Results of broker operations are reported through [`Deferred`](deferred::Deferred)
//! handles and connection events through a [`ConnectionHandler`](callbacks::ConnectionHandler).
//!
//! With the `tokio` feature, [`net::TokioDriver`] runs a connection over a tokio stream.
//!
//! # Example
//! ```rust,no_run
//! use amqpcore::{
//!     callbacks::DefaultConnectionHandler,
//!     channel::{BasicConsumeArguments, QueueBindArguments, QueueDeclareArguments},
//!     connection::OpenConnectionArguments,
//!     net::TokioDriver,
//! };
//!
//! # async fn consume() -> amqpcore::error::Result<()> {
//! let args = OpenConnectionArguments::new("localhost", 5672, "user", "bitnami");
//! let driver = TokioDriver::connect(args, DefaultConnectionHandler).await?;
//! let channel = driver.connection().open_channel()?;
//!
//! channel.declare_queue(QueueDeclareArguments::new("capy-test"))?;
//! channel.bind_queue(QueueBindArguments::new("capy-test", "amq.topic", "echo.ping"))?;
//! let consumer = channel.consume(BasicConsumeArguments::new("capy-test", ""))?;
//! let acker = channel.clone();
//! consumer.on_received(move |message| {
//!     println!("received {:?}", message.body());
//!     let _ = acker.ack(message.delivery_tag());
//! });
//!
//! driver.run().await
//! # }
//! ```
pub mod frame;
pub mod net;

mod api;

pub use api::*;
pub use frame::BasicProperties;
pub use net::transport;

pub use api::{
    channel::Channel,
    connection::{Connection, ConnectionState, OpenConnectionArguments},
    deferred::{Consumer, Deferred},
    error::Error,
    message::{Message, ReturnedMessage},
};
