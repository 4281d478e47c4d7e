use super::ChunkIndex;
use crate::byte_order::{read_network_u32_at, write_network_u32};

/// Header describing a single image chunk.
///
/// The header repeats the declared chunk count on every chunk so a receiver
/// can start a transfer from whichever chunk arrives first.
///
/// # Examples
///
/// ```
/// use snapwire::packet::{ChunkHeader, ChunkIndex};
/// let header = ChunkHeader::new(3, ChunkIndex::new(2));
/// assert_eq!(header.total_chunks(), 3);
/// assert!(header.is_last_chunk());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    total_chunks: u32,
    chunk_index: ChunkIndex,
}

impl ChunkHeader {
    /// Encoded size of the header, excluding the kind field.
    pub const ENCODED_LEN: usize = 8;

    /// Create a new chunk header.
    #[must_use]
    pub const fn new(total_chunks: u32, chunk_index: ChunkIndex) -> Self {
        Self {
            total_chunks,
            chunk_index,
        }
    }

    /// Number of chunks the sender declared for the whole transfer.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    /// Position of this chunk within the transfer.
    #[must_use]
    pub const fn chunk_index(&self) -> ChunkIndex { self.chunk_index }

    /// Report whether the index names the final chunk of the declared range.
    #[must_use]
    pub const fn is_last_chunk(&self) -> bool {
        self.total_chunks > 0 && self.chunk_index.get() == self.total_chunks - 1
    }

    /// Report whether the index falls inside `[0, total_chunks)`.
    #[must_use]
    pub const fn is_in_range(&self) -> bool { self.chunk_index.get() < self.total_chunks }

    pub(crate) fn write_to(self, buf: &mut bytes::BytesMut) {
        buf.extend_from_slice(&write_network_u32(self.total_chunks));
        buf.extend_from_slice(&write_network_u32(self.chunk_index.get()));
    }

    /// Parse a header from the eight bytes that follow the kind field.
    pub(crate) fn read_from(bytes: &[u8]) -> Option<Self> {
        let total_chunks = read_network_u32_at(bytes, 0)?;
        let chunk_index = read_network_u32_at(bytes, 4)?;
        Some(Self::new(total_chunks, ChunkIndex::new(chunk_index)))
    }
}
