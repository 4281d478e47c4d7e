//! Error types emitted by the reassembly engine.

use std::num::{NonZeroU32, NonZeroUsize};

use thiserror::Error;

use super::SenderId;
use crate::packet::ChunkIndex;

/// Why a transfer or chunk was refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RejectReason {
    /// The chunk declares an empty transfer.
    #[error("declared chunk count is zero")]
    ZeroChunks,
    /// The declared chunk count exceeds the configured cap.
    #[error("declared {declared} chunks, limit is {limit}")]
    TooManyChunks {
        /// Chunk count carried by the header.
        declared: u32,
        /// Configured cap.
        limit: NonZeroU32,
    },
    /// The chunk index lies outside `[0, total_chunks)`.
    #[error("chunk index {index} outside declared range of {total_chunks}")]
    IndexOutOfRange {
        /// Offending index.
        index: ChunkIndex,
        /// Declared chunk count.
        total_chunks: u32,
    },
    /// Buffering the chunk would exceed the per-transfer byte cap.
    #[error("transfer would buffer {attempted} bytes, limit is {limit}")]
    TooLarge {
        /// Bytes the transfer would hold after the chunk.
        attempted: usize,
        /// Configured cap.
        limit: NonZeroUsize,
    },
    /// The transfer table is full.
    #[error("{limit} transfers already in flight")]
    CapacityExhausted {
        /// Configured in-flight cap.
        limit: NonZeroUsize,
    },
}

/// Errors produced while feeding chunks to a [`Reassembler`](super::Reassembler).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The chunk was refused. The transfer it belongs to is discarded only
    /// when the reason is [`RejectReason::TooLarge`].
    #[error("transfer from {sender} rejected: {reason}")]
    TransferRejected {
        /// Sender whose chunk was refused.
        sender: SenderId,
        /// Limit that was violated.
        reason: RejectReason,
    },
}

impl ReassemblyError {
    /// Return the reason carried by a rejection.
    #[must_use]
    pub const fn reason(&self) -> RejectReason {
        match self {
            Self::TransferRejected { reason, .. } => *reason,
        }
    }
}
