//! Shared builders for reassembly tests.

use std::{net::SocketAddr, num::NonZeroUsize};

use bytes::Bytes;

use crate::{
    fragment::{FragmentationConfig, Fragmenter},
    packet::{ChunkHeader, ChunkIndex, Packet},
    reassembly::{ReassemblyConfig, SenderId},
};

/// Payload ceiling used by the small test budget.
pub const TEST_PAYLOAD_LIMIT: usize = 1_000;

/// Fragmentation settings with a 112-byte datagram (100-byte chunks).
pub fn small_fragmentation() -> FragmentationConfig {
    let limit = NonZeroUsize::new(TEST_PAYLOAD_LIMIT).expect("non-zero");
    FragmentationConfig::for_datagram_budget(112, limit).expect("budget fits")
}

/// Reassembly limits matching [`small_fragmentation`]: ten chunks, 1000 bytes.
pub fn small_config() -> ReassemblyConfig { ReassemblyConfig::from_fragmentation(&small_fragmentation()) }

pub fn sender(port: u16) -> SenderId { SenderId::from(SocketAddr::from(([127, 0, 0, 1], port))) }

pub fn header(total_chunks: u32, index: u32) -> ChunkHeader {
    ChunkHeader::new(total_chunks, ChunkIndex::new(index))
}

/// Payload of `0x00..` counting bytes, wrapping at 256.
pub fn counting_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 256).expect("below 256"))
        .collect()
}

/// Split `payload` with `fragmentation` into `(header, body)` pairs.
pub fn chunks(fragmentation: FragmentationConfig, payload: &[u8]) -> Vec<(ChunkHeader, Bytes)> {
    Fragmenter::new(fragmentation)
        .fragment(payload.to_vec())
        .expect("fragment")
        .into_iter()
        .map(|packet| match packet {
            Packet::ImageChunk { header, body } => (header, body),
            Packet::Text(_) => panic!("fragmenter produced text"),
        })
        .collect()
}
