//! Encoding and decoding of whole datagrams.
//!
//! Decoding slices the incoming [`Bytes`] instead of copying, so chunk bodies
//! handed to the reassembly engine share the receive buffer.

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

use super::{CHUNK_HEADER_LEN, ChunkHeader, KIND_LEN, PacketError, PacketKind};
use crate::byte_order::{read_network_u32_at, write_network_u32};

/// A decoded snapwire datagram.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use snapwire::packet::{ChunkHeader, ChunkIndex, Packet};
///
/// let packet = Packet::image_chunk(ChunkHeader::new(2, ChunkIndex::zero()), Bytes::from_static(b"ab"));
/// let decoded = Packet::decode(packet.encode()).expect("valid datagram");
/// assert_eq!(decoded, packet);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Short text message delivered without fragmentation.
    Text(Bytes),
    /// One chunk of an image transfer.
    ImageChunk {
        /// Position and declared chunk count.
        header: ChunkHeader,
        /// Opaque chunk body.
        body: Bytes,
    },
}

impl Packet {
    /// Build a text packet from a string.
    #[must_use]
    pub fn text(message: &str) -> Self { Self::Text(Bytes::copy_from_slice(message.as_bytes())) }

    /// Build an image chunk packet.
    #[must_use]
    pub const fn image_chunk(header: ChunkHeader, body: Bytes) -> Self {
        Self::ImageChunk { header, body }
    }

    /// Kind written in the leading field.
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        match self {
            Self::Text(_) => PacketKind::Text,
            Self::ImageChunk { .. } => PacketKind::ImageChunk,
        }
    }

    /// Borrow the packet body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        match self {
            Self::Text(body) | Self::ImageChunk { body, .. } => body,
        }
    }

    /// Text body decoded as UTF-8, replacing invalid sequences.
    ///
    /// Returns `None` for image chunks.
    #[must_use]
    pub fn text_lossy(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(body) => Some(String::from_utf8_lossy(body)),
            Self::ImageChunk { .. } => None,
        }
    }

    /// Total datagram length once encoded.
    #[must_use]
    pub fn encoded_len(&self) -> usize { self.kind().header_len() + self.body().len() }

    /// Encode the packet into a datagram.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.extend_from_slice(&write_network_u32(self.kind().into()));
        if let Self::ImageChunk { header, .. } = self {
            header.write_to(&mut buf);
        }
        buf.extend_from_slice(self.body());
        buf.freeze()
    }

    /// Decode a datagram.
    ///
    /// The body is sliced out of `datagram` without copying.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Malformed`] when the datagram is shorter than
    /// four bytes, or shorter than twelve bytes for an image chunk, and
    /// [`PacketError::UnknownKind`] for an undefined kind value.
    pub fn decode(datagram: Bytes) -> Result<Self, PacketError> {
        let Some(raw_kind) = read_network_u32_at(&datagram, 0) else {
            return Err(PacketError::Malformed {
                kind: None,
                len: datagram.len(),
                needed: KIND_LEN,
            });
        };
        match PacketKind::try_from(raw_kind)? {
            PacketKind::Text => Ok(Self::Text(datagram.slice(KIND_LEN..))),
            PacketKind::ImageChunk => {
                let header = datagram
                    .get(KIND_LEN..CHUNK_HEADER_LEN)
                    .and_then(ChunkHeader::read_from)
                    .ok_or(PacketError::Malformed {
                        kind: Some(PacketKind::ImageChunk),
                        len: datagram.len(),
                        needed: CHUNK_HEADER_LEN,
                    })?;
                Ok(Self::ImageChunk {
                    header,
                    body: datagram.slice(CHUNK_HEADER_LEN..),
                })
            }
        }
    }
}
