pub(crate) mod channel_id_repo;
pub mod transport;

#[cfg(feature = "tokio")]
mod tokio_driver;
#[cfg(feature = "tokio")]
pub use tokio_driver::TokioDriver;
