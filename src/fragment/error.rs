//! Error types emitted by the outbound half.

use std::io;

use thiserror::Error;

use crate::capture::CaptureError;

/// Errors produced while turning a payload into packets.
///
/// Each variant is raised before the first datagram is emitted, so a
/// rejected send never leaves a partial transfer on the wire.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The image payload exceeds the configured ceiling.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// The encoded text packet exceeds the datagram budget.
    #[error("text message of {size} bytes exceeds the {limit} byte datagram limit")]
    MessageTooLong {
        /// Encoded packet size.
        size: usize,
        /// Datagram budget.
        limit: usize,
    },
    /// The payload needs more chunks than a `u32` index can number.
    #[error("payload needs {chunks} chunks, more than the wire format can index")]
    TooManyChunks {
        /// Number of chunks the payload would need.
        chunks: usize,
    },
}

/// Errors surfaced by [`ChunkSender`](super::ChunkSender).
#[derive(Debug, Error)]
pub enum SendError {
    /// The payload was rejected before sending.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The producer failed to supply a payload.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    /// The local transport refused a datagram.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}
