//! Wire codec for snapwire datagrams.
//!
//! Every datagram starts with a 4-byte [`PacketKind`]. Text packets carry the
//! UTF-8 body directly after the kind; image chunks carry a [`ChunkHeader`]
//! (declared chunk count and this chunk's index) before the opaque body. All
//! integers are big-endian. The codec is stateless so both the sending and
//! receiving halves share it.

pub mod codec;
pub mod error;
pub mod header;
pub mod index;
pub mod kind;

pub use codec::Packet;
pub use error::PacketError;
pub use header::ChunkHeader;
pub use index::ChunkIndex;
pub use kind::PacketKind;

/// Bytes occupied by the leading kind field.
pub const KIND_LEN: usize = 4;

/// Bytes occupied by the kind field plus the image chunk header.
pub const CHUNK_HEADER_LEN: usize = KIND_LEN + ChunkHeader::ENCODED_LEN;

/// Default per-datagram ceiling, comfortably below the UDP maximum.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 60_000;
