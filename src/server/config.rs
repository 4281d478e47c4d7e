//! Builder methods shared by bound and unbound servers.

use std::{num::NonZeroUsize, sync::Arc};

use tokio::sync::oneshot;

use super::{BackoffConfig, ServerState, SnapServer};
use crate::{reassembly::ReassemblyConfig, sink::TextSink};

impl<S: ServerState> SnapServer<S> {
    /// Set the number of worker tasks. Values below one are raised to one.
    ///
    /// # Examples
    ///
    /// ```
    /// use snapwire::{server::SnapServer, sink::DirectorySink};
    ///
    /// let server = SnapServer::new(DirectorySink::new("out")).workers(0);
    /// assert_eq!(server.worker_count(), 1);
    /// ```
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    /// Set the depth of the queue between the receive loop and the workers.
    ///
    /// When the queue is full the receive loop waits and further datagrams
    /// accumulate in the socket's receive buffer.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Replace the reassembly limits.
    #[must_use]
    pub fn reassembly(mut self, config: ReassemblyConfig) -> Self {
        self.reassembly = config;
        self
    }

    /// Install the consumer of text messages.
    #[must_use]
    pub fn text_sink(mut self, sink: impl TextSink + 'static) -> Self {
        self.text_sink = Arc::new(sink);
        self
    }

    /// Configure the back-off applied after receive failures.
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff.normalized();
        self
    }

    /// Register a channel notified once the workers are running.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Configured worker count.
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.workers }

    /// Largest datagram the server will process.
    #[must_use]
    pub const fn max_datagram(&self) -> usize { self.max_datagram_size }

    /// Reassembly limits in effect.
    #[must_use]
    pub const fn reassembly_config(&self) -> &ReassemblyConfig { &self.reassembly }
}
