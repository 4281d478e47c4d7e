//! Tokio-based receiving server.
//!
//! `SnapServer` runs one receive loop that pulls datagrams off the transport
//! and hands them to a fixed pool of worker tasks through a bounded queue.
//! Workers decode each datagram, deliver text messages to the text sink and
//! feed image chunks to the reassembly actor, which passes completed
//! transfers to the transfer sink.

use std::{num::NonZeroUsize, sync::Arc};

use tokio::sync::oneshot;

use crate::{
    packet::DEFAULT_MAX_DATAGRAM_SIZE,
    reassembly::ReassemblyConfig,
    sink::{LogTextSink, TextSink, TransferSink},
    transport::DatagramRx,
};

/// Receiving server for chunked transfers and text messages.
///
/// The server carries a typestate `S` indicating whether it is [`Unbound`]
/// (no transport yet) or [`Bound`]. New servers start `Unbound` and must call
/// [`bind`](SnapServer::bind) or one of its siblings before running.
///
/// # Examples
///
/// ```no_run
/// use snapwire::{server::SnapServer, sink::DirectorySink};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), snapwire::server::ServerError> {
/// let server = SnapServer::new(DirectorySink::new("screenshots"))
///     .workers(4)
///     .bind(([0, 0, 0, 0], 4567).into())?;
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct SnapServer<S: ServerState = Unbound> {
    pub(crate) workers: usize,
    pub(crate) queue_capacity: NonZeroUsize,
    pub(crate) max_datagram_size: usize,
    pub(crate) reassembly: ReassemblyConfig,
    pub(crate) transfer_sink: Arc<dyn TransferSink>,
    pub(crate) text_sink: Arc<dyn TextSink>,
    pub(crate) backoff: BackoffConfig,
    /// Channel used to notify when the server is ready.
    ///
    /// A `oneshot::Sender` can transmit only one readiness notification, so a
    /// new sender must be provided each time a server is started.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    /// Typestate tracking whether the server has a transport.
    pub(crate) state: S,
}

impl SnapServer<Unbound> {
    /// Create a server that hands completed transfers to `sink`.
    ///
    /// Text messages are logged until [`text_sink`](SnapServer::text_sink)
    /// installs another consumer. The worker count defaults to the number of
    /// available CPUs.
    #[must_use]
    pub fn new(sink: impl TransferSink + 'static) -> Self {
        Self::with_sink(Arc::new(sink))
    }

    /// Create a server from a shared transfer sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn TransferSink>) -> Self {
        let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            reassembly: ReassemblyConfig::default(),
            transfer_sink: sink,
            text_sink: Arc::new(LogTextSink),
            backoff: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }
}

impl<S: ServerState> std::fmt::Debug for SnapServer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapServer")
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("max_datagram_size", &self.max_datagram_size)
            .field("reassembly", &self.reassembly)
            .field("backoff", &self.backoff)
            .field("ready_tx", &self.ready_tx.is_some())
            .finish_non_exhaustive()
    }
}

/// Default depth of the queue between the receive loop and the workers.
pub const DEFAULT_QUEUE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Marker indicating the server has no transport yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server owns a receiving transport.
#[derive(Clone)]
pub struct Bound {
    pub(crate) transport: Arc<dyn DatagramRx>,
}

impl std::fmt::Debug for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound")
            .field("local_addr", &self.transport.local_addr().ok())
            .finish()
    }
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod backoff;
mod binding;
mod config;
mod dispatch;
pub mod error;
mod runtime;
mod worker;

pub use backoff::BackoffConfig;
pub use error::ServerError;
