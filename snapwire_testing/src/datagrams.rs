//! Builders for raw datagrams.

use bytes::{BufMut, Bytes, BytesMut};
use snapwire::packet::{ChunkHeader, ChunkIndex, Packet};

/// Encode a text packet.
#[must_use]
pub fn text_datagram(message: &str) -> Bytes { Packet::text(message).encode() }

/// Encode an image chunk carrying `body`.
#[must_use]
pub fn chunk_datagram(total_chunks: u32, index: u32, body: &[u8]) -> Bytes {
    Packet::image_chunk(
        ChunkHeader::new(total_chunks, ChunkIndex::new(index)),
        Bytes::copy_from_slice(body),
    )
    .encode()
}

/// Build a datagram with an arbitrary kind field followed by `rest`.
///
/// Useful for unknown kinds and truncated headers.
#[must_use]
pub fn raw_datagram(kind: u32, rest: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 + rest.len());
    buf.put_u32(kind);
    buf.extend_from_slice(rest);
    buf.freeze()
}
