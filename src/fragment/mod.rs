//! Outbound chunking of image transfers and text messages.
//!
//! [`Fragmenter`] turns a payload into a [`ChunkBatch`] of image chunk
//! packets sized for the datagram budget described by
//! [`FragmentationConfig`]. [`ChunkSender`] drives a batch over a
//! [`DatagramTx`](crate::transport::DatagramTx), optionally paced by a
//! fixed datagram rate.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod sender;

pub use config::FragmentationConfig;
pub use error::{FragmentationError, SendError};
pub use fragmenter::{ChunkBatch, Fragmenter};
pub use sender::{ChunkSender, RateLimit, SendReport, SenderConfig};
