//! Shared utilities for integration tests.
//!
//! Provides a server harness driven over the in-memory transport and the
//! small datagram budget most scenarios use.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    sync::Arc,
    time::Duration,
};

use snapwire::{
    fragment::{ChunkSender, FragmentationConfig, SenderConfig},
    packet::DEFAULT_MAX_DATAGRAM_SIZE,
    reassembly::ReassemblyConfig,
    server::{ServerError, SnapServer},
};
use snapwire_testing::{MemoryInjector, MemorySender, RecordingSink, RecordingTextSink, memory_link};
use tokio::{sync::oneshot, task::JoinHandle, time::timeout};

/// Datagram budget giving 100-byte chunk bodies.
pub const SMALL_DATAGRAM: usize = 112;

/// Upper bound on how long a test waits for the server.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn addr(port: u16) -> SocketAddr { SocketAddr::from(([10, 0, 0, 1], port)) }

/// Fragmentation settings with 100-byte chunks and a 1000-byte ceiling.
#[expect(
    clippy::expect_used,
    reason = "a constant test budget that does not fit must abort the test"
)]
pub fn small_fragmentation() -> FragmentationConfig {
    let limit = NonZeroUsize::new(1_000).expect("non-zero");
    FragmentationConfig::for_datagram_budget(SMALL_DATAGRAM, limit).expect("budget fits")
}

/// Payload repeating the bytes `0x00..=0xF9`.
#[expect(clippy::expect_used, reason = "values stay below 250")]
pub fn pattern_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 250).expect("below 250"))
        .collect()
}

/// A running server fed through a [`memory_link`].
pub struct MemoryServer {
    pub injector: MemoryInjector,
    pub saved: RecordingSink,
    pub texts: RecordingTextSink,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl MemoryServer {
    /// Start a single-worker server using the small datagram budget.
    pub async fn start() -> Self {
        Self::start_with(ReassemblyConfig::from_fragmentation(&small_fragmentation())).await
    }

    /// Start a single-worker server with explicit reassembly limits.
    pub async fn start_with(reassembly: ReassemblyConfig) -> Self {
        Self::start_configured(SMALL_DATAGRAM, reassembly).await
    }

    /// Start a single-worker server with default limits and datagram size.
    pub async fn start_default() -> Self {
        Self::start_configured(DEFAULT_MAX_DATAGRAM_SIZE, ReassemblyConfig::default()).await
    }

    /// Start a single-worker server.
    ///
    /// One worker keeps chunks reaching the reassembly actor in arrival order.
    #[expect(clippy::expect_used, reason = "a server that never starts must fail the test")]
    pub async fn start_configured(max_datagram: usize, reassembly: ReassemblyConfig) -> Self {
        let (injector, receiver) = memory_link(addr(4567));
        let saved = RecordingSink::new();
        let texts = RecordingTextSink::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let server = SnapServer::new(saved.clone())
            .max_datagram_size(max_datagram)
            .workers(1)
            .reassembly(reassembly)
            .text_sink(texts.clone())
            .ready_signal(ready_tx)
            .bind_transport(Arc::new(receiver));

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run_with_shutdown(async {
            let _ = shutdown_rx.await;
        }));
        timeout(WAIT, ready_rx)
            .await
            .expect("server ready in time")
            .expect("ready signal sent");

        Self {
            injector,
            saved,
            texts,
            shutdown,
            task,
        }
    }

    /// A chunk sender using the small budget over `transport`.
    pub fn chunk_sender(&self, transport: MemorySender) -> ChunkSender<MemorySender> {
        ChunkSender::new(transport, SenderConfig {
            fragmentation: small_fragmentation(),
            rate_limit: None,
        })
    }

    /// Stop the server and wait for it to drain.
    #[expect(clippy::expect_used, reason = "a server that fails to stop must fail the test")]
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        timeout(WAIT, self.task)
            .await
            .expect("server stopped in time")
            .expect("join server task")
            .expect("server run failed");
    }
}
