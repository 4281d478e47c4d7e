//! Utilities for exercising `snapwire` without real sockets.
//!
//! [`memory_link`] pairs an injector with a [`DatagramRx`] so a
//! [`SnapServer`](snapwire::server::SnapServer) can be driven from
//! in-memory senders, optionally losing or reordering datagrams. Recording
//! sinks capture what the server delivered and builders produce raw
//! datagrams, including malformed ones.
//!
//! ```rust
//! use snapwire_testing::{chunk_datagram, memory_link};
//!
//! # async fn example() {
//! let (injector, _receiver) = memory_link("127.0.0.1:4567".parse().unwrap());
//! injector.inject("10.0.0.1:5000".parse().unwrap(), chunk_datagram(1, 0, b"hi"));
//! # }
//! ```
//!
//! [`DatagramRx`]: snapwire::transport::DatagramRx

pub mod datagrams;
pub mod metrics;
pub mod sinks;
pub mod transport;

pub use datagrams::{chunk_datagram, raw_datagram, text_datagram};
pub use sinks::{RecordingSink, RecordingTextSink};
pub use transport::{MemoryInjector, MemoryReceiver, MemorySender, memory_link};
