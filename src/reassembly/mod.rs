//! Inbound reassembly of chunked transfers.
//!
//! [`Reassembler`] owns the per-sender transfer table. It accepts chunks in
//! any order, ignores duplicates, enforces chunk-count, byte and in-flight
//! limits, and evicts transfers that stop making progress. The
//! [`ReassemblyService`] actor wraps a reassembler in a task so concurrent
//! workers feed it through a channel instead of sharing a lock.

pub mod config;
pub mod error;
pub mod id;
pub mod reassembler;
pub mod service;
mod transfer;

pub use config::ReassemblyConfig;
pub use error::{ReassemblyError, RejectReason};
pub use id::SenderId;
pub use reassembler::{ChunkOutcome, CompletedTransfer, Reassembler};
pub use service::{ReassemblyHandle, ReassemblyService, ReassemblyStats, ServiceClosed};
