//! Sending half: fragments payloads and emits them over a transport.

use std::{fmt, num::NonZeroUsize, time::Duration};

use bytes::Bytes;
use leaky_bucket::RateLimiter;
use tracing::{debug, info};

use super::{FragmentationConfig, Fragmenter, SendError};
use crate::{capture::ScreenSource, metrics, transport::DatagramTx};

/// Fixed pacing applied to outbound datagrams.
///
/// Pacing is a static ceiling chosen by the operator. The sender never adapts
/// it to observed loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Datagrams released per second.
    pub datagrams_per_second: NonZeroUsize,
}

/// Settings for a [`ChunkSender`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenderConfig {
    /// Datagram and payload limits.
    pub fragmentation: FragmentationConfig,
    /// Optional datagram pacing. `None` sends as fast as the transport allows.
    pub rate_limit: Option<RateLimit>,
}

/// Summary of a completed image send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendReport {
    /// Number of chunk datagrams emitted.
    pub total_chunks: u32,
    /// Payload bytes covered by those chunks.
    pub payload_len: usize,
}

/// Fragments payloads and emits each chunk as one datagram.
///
/// # Examples
///
/// ```no_run
/// use snapwire::{
///     fragment::{ChunkSender, SenderConfig},
///     transport::UdpTarget,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let target = UdpTarget::connect("127.0.0.1:4567".parse()?).await?;
/// let sender = ChunkSender::new(target, SenderConfig::default());
/// sender.send_text("hello").await?;
/// let report = sender.send_image(vec![0_u8; 150_000]).await?;
/// assert_eq!(report.total_chunks, 3);
/// # Ok(())
/// # }
/// ```
pub struct ChunkSender<T> {
    fragmenter: Fragmenter,
    transport: T,
    limiter: Option<RateLimiter>,
}

impl<T> fmt::Debug for ChunkSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkSender")
            .field("fragmenter", &self.fragmenter)
            .field("paced", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: DatagramTx> ChunkSender<T> {
    /// Create a sender emitting datagrams through `transport`.
    #[must_use]
    pub fn new(transport: T, config: SenderConfig) -> Self {
        let limiter = config.rate_limit.map(|limit| {
            let rate = limit.datagrams_per_second.get();
            RateLimiter::builder()
                .initial(rate)
                .refill(rate)
                .interval(Duration::from_secs(1))
                .max(rate)
                .build()
        });
        Self {
            fragmenter: Fragmenter::new(config.fragmentation),
            transport,
            limiter,
        }
    }

    /// Borrow the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T { &self.transport }

    /// Return the fragmenter used for outbound payloads.
    #[must_use]
    pub const fn fragmenter(&self) -> &Fragmenter { &self.fragmenter }

    /// Send `message` as a single text datagram.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Fragmentation`] when the message does not fit in
    /// one datagram (nothing is sent), or [`SendError::Transport`] if the
    /// transport rejects the datagram.
    pub async fn send_text(&self, message: &str) -> Result<(), SendError> {
        let packet = self.fragmenter.text(message)?;
        self.emit(packet.encode()).await?;
        metrics::inc_text_sent();
        debug!(len = message.len(), "text message sent");
        Ok(())
    }

    /// Fragment `payload` and send every chunk in index order.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Fragmentation`] when the payload is rejected
    /// before any datagram is emitted, or [`SendError::Transport`] if the
    /// transport rejects a datagram part-way through.
    pub async fn send_image(&self, payload: impl Into<Bytes>) -> Result<SendReport, SendError> {
        let batch = self.fragmenter.fragment(payload)?;
        let total_chunks = batch.total_chunks();
        debug!(
            payload_len = batch.payload_len(),
            total_chunks, "sending image in chunks"
        );
        for (sent, datagram) in batch.datagrams().enumerate() {
            self.emit(datagram).await?;
            debug!(chunk = sent + 1, total_chunks, "chunk sent");
        }
        info!(
            payload_len = batch.payload_len(),
            total_chunks, "image sent"
        );
        Ok(SendReport {
            total_chunks,
            payload_len: batch.payload_len(),
        })
    }

    /// Capture a payload from `source` and send it.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Capture`] if the producer fails, otherwise the
    /// errors of [`send_image`](Self::send_image).
    pub async fn send_capture<S>(&self, source: &S) -> Result<SendReport, SendError>
    where
        S: ScreenSource + ?Sized,
    {
        let payload = source.capture().await?;
        self.send_image(payload).await
    }

    async fn emit(&self, datagram: Bytes) -> Result<(), SendError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire(1).await;
        }
        self.transport.send_datagram(datagram).await?;
        metrics::inc_datagrams_sent();
        Ok(())
    }
}
