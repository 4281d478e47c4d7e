//! Errors raised while decoding datagrams.

use thiserror::Error;

use super::PacketKind;

/// Reasons a datagram cannot be decoded into a [`Packet`](super::Packet).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The datagram is too short to hold the header its kind requires.
    #[error("malformed packet: {len} bytes cannot hold a {kind:?} header of {needed} bytes")]
    Malformed {
        /// Kind read from the datagram, if at least four bytes were present.
        kind: Option<PacketKind>,
        /// Length of the datagram received.
        len: usize,
        /// Minimum length the header requires.
        needed: usize,
    },
    /// The kind field holds a value no packet type is defined for.
    #[error("unknown packet kind {kind}")]
    UnknownKind {
        /// Raw kind value read from the datagram.
        kind: u32,
    },
}
