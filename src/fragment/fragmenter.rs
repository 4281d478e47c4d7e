//! Outbound helper that splits payloads into image chunk packets.
//!
//! [`Fragmenter`] checks the payload against the configured ceiling, then
//! slices it into chunks of [`FragmentationConfig::chunk_capacity`] bytes,
//! tagging each with the declared chunk count and its index. Chunks share the
//! payload's allocation through [`Bytes`] slices.

use bytes::Bytes;

use super::{FragmentationConfig, FragmentationError};
use crate::packet::{ChunkHeader, ChunkIndex, Packet};

/// Splits payloads into datagram-sized packets.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fragmenter {
    config: FragmentationConfig,
}

impl Fragmenter {
    /// Create a fragmenter bounded by `config`.
    #[must_use]
    pub const fn new(config: FragmentationConfig) -> Self { Self { config } }

    /// Return the limits this fragmenter enforces.
    #[must_use]
    pub const fn config(&self) -> &FragmentationConfig { &self.config }

    /// Split `payload` into image chunks.
    ///
    /// An empty payload produces a single empty chunk declaring one chunk in
    /// total, so the receiver still observes a completed transfer.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::PayloadTooLarge`] when the payload exceeds
    /// the configured ceiling, or [`FragmentationError::TooManyChunks`] if the
    /// chunk count cannot be expressed as a `u32`.
    pub fn fragment(&self, payload: impl Into<Bytes>) -> Result<ChunkBatch, FragmentationError> {
        let payload = payload.into();
        let limit = self.config.max_payload_size().get();
        if payload.len() > limit {
            return Err(FragmentationError::PayloadTooLarge {
                size: payload.len(),
                limit,
            });
        }

        if payload.is_empty() {
            let header = ChunkHeader::new(1, ChunkIndex::zero());
            return Ok(ChunkBatch::new(1, 0, vec![Packet::image_chunk(
                header,
                Bytes::new(),
            )]));
        }

        let capacity = self.config.chunk_capacity().get();
        let chunks = payload.len().div_ceil(capacity);
        let total_chunks =
            u32::try_from(chunks).map_err(|_| FragmentationError::TooManyChunks { chunks })?;

        let mut packets = Vec::with_capacity(chunks);
        for (index, start) in (0..total_chunks).zip((0..payload.len()).step_by(capacity)) {
            let end = (start + capacity).min(payload.len());
            packets.push(Packet::image_chunk(
                ChunkHeader::new(total_chunks, ChunkIndex::new(index)),
                payload.slice(start..end),
            ));
        }

        Ok(ChunkBatch::new(total_chunks, payload.len(), packets))
    }

    /// Build the single packet carrying `message`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::MessageTooLong`] when the encoded packet
    /// would exceed the datagram budget.
    pub fn text(&self, message: &str) -> Result<Packet, FragmentationError> {
        let packet = Packet::text(message);
        let limit = self.config.max_datagram_size().get();
        if packet.encoded_len() > limit {
            return Err(FragmentationError::MessageTooLong {
                size: packet.encoded_len(),
                limit,
            });
        }
        Ok(packet)
    }
}

/// Image chunks produced for a single payload, in index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBatch {
    total_chunks: u32,
    payload_len: usize,
    packets: Vec<Packet>,
}

impl ChunkBatch {
    fn new(total_chunks: u32, payload_len: usize, packets: Vec<Packet>) -> Self {
        debug_assert!(!packets.is_empty(), "chunk batches must not be empty");
        Self {
            total_chunks,
            payload_len,
            packets,
        }
    }

    /// Chunk count declared in every header of the batch.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    /// Length of the payload the batch covers.
    #[must_use]
    pub const fn payload_len(&self) -> usize { self.payload_len }

    /// Return the packets as a slice.
    #[must_use]
    pub fn packets(&self) -> &[Packet] { self.packets.as_slice() }

    /// Number of packets in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.packets.len() }

    /// Encode every packet into a datagram, preserving index order.
    pub fn datagrams(&self) -> impl ExactSizeIterator<Item = Bytes> + '_ {
        self.packets.iter().map(Packet::encode)
    }
}

impl IntoIterator for ChunkBatch {
    type Item = Packet;
    type IntoIter = std::vec::IntoIter<Packet>;

    fn into_iter(self) -> Self::IntoIter { self.packets.into_iter() }
}
