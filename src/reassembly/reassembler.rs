//! Per-sender reassembly state machine.
//!
//! Each [`SenderId`] is either absent from the table or collecting chunks.
//! A chunk for an absent sender opens a transfer; the chunk that brings the
//! received count up to the declared total closes it, concatenating the
//! chunks by index and removing the entry. Nothing about arrival order is
//! assumed, and repeated indices are ignored. The table is purged of
//! transfers that stop making progress, either on every push or by an
//! explicit sweep.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Instant,
};

use bytes::Bytes;
use tracing::{debug, warn};

use super::{ReassemblyConfig, ReassemblyError, RejectReason, SenderId, transfer::TransferState};
use crate::{
    metrics::{self, TransferOutcome},
    packet::ChunkHeader,
};

/// A fully reassembled payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedTransfer {
    sender: SenderId,
    total_chunks: u32,
    payload: Bytes,
}

impl CompletedTransfer {
    /// Construct a completed transfer.
    #[must_use]
    pub fn new(sender: SenderId, total_chunks: u32, payload: Bytes) -> Self {
        Self {
            sender,
            total_chunks,
            payload,
        }
    }

    /// Sender whose chunks formed this payload.
    #[must_use]
    pub const fn sender(&self) -> SenderId { self.sender }

    /// Number of chunks the payload was split into.
    #[must_use]
    pub const fn total_chunks(&self) -> u32 { self.total_chunks }

    /// Borrow the reassembled payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the transfer, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}

/// Result of feeding one chunk to the [`Reassembler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The chunk was stored; the transfer still expects more.
    Pending {
        /// Distinct chunks held for the transfer.
        received: u32,
        /// Declared chunk count.
        total_chunks: u32,
    },
    /// The index was already held; the chunk was ignored.
    Duplicate,
    /// The chunk completed the transfer, which has left the table.
    Complete(CompletedTransfer),
}

/// Stateful chunk reassembler with timeout-based eviction.
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblyConfig,
    transfers: HashMap<SenderId, TransferState>,
}

impl Reassembler {
    /// Create an empty reassembler bounded by `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config: config.normalized(),
            transfers: HashMap::new(),
        }
    }

    /// Limits this reassembler enforces.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    /// Process a chunk using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::TransferRejected`] when the header declares
    /// an implausible transfer or the chunk would breach a limit.
    pub fn push(
        &mut self,
        sender: SenderId,
        header: ChunkHeader,
        body: Bytes,
    ) -> Result<ChunkOutcome, ReassemblyError> {
        self.push_at(sender, header, body, Instant::now())
    }

    /// Process a chunk using an explicit clock reading.
    ///
    /// Accepting an explicit `now` keeps eviction deterministic in tests and
    /// lets callers co-ordinate sweeps with their own timers.
    ///
    /// A chunk whose declared total differs from the transfer already in
    /// flight for `sender` starts a new transfer, discarding the old one.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::TransferRejected`] when the header declares
    /// zero chunks, more chunks than the cap, or an index outside its range;
    /// when the table is full; or when the transfer would exceed the byte
    /// cap, in which case its partial state is discarded.
    pub fn push_at(
        &mut self,
        sender: SenderId,
        header: ChunkHeader,
        body: Bytes,
        now: Instant,
    ) -> Result<ChunkOutcome, ReassemblyError> {
        self.purge_expired_at(now);
        self.validate(sender, header)?;

        let index = header.chunk_index();
        let total_chunks = header.total_chunks();

        if let Entry::Occupied(existing) = self.transfers.entry(sender)
            && existing.get().total_chunks() != total_chunks
        {
            let replaced = existing.remove();
            metrics::record_transfer(TransferOutcome::Replaced);
            warn!(
                %sender,
                previous_total = replaced.total_chunks(),
                previous_received = replaced.received_len(),
                total_chunks,
                "new transfer replaces incomplete transfer"
            );
        }

        let in_flight = self.transfers.len();
        let limit = self.config.max_transfer_size;
        let outcome = match self.transfers.entry(sender) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().contains(index) {
                    debug!(%sender, %index, "duplicate chunk ignored");
                    return Ok(ChunkOutcome::Duplicate);
                }
                let attempted = occupied.get().buffered_bytes().saturating_add(body.len());
                if attempted > limit.get() {
                    occupied.remove();
                    return Err(reject(sender, RejectReason::TooLarge { attempted, limit }));
                }
                occupied.get_mut().insert(index, body, now);
                if occupied.get().is_complete() {
                    let state = occupied.remove();
                    ChunkOutcome::Complete(CompletedTransfer::new(
                        sender,
                        total_chunks,
                        state.into_payload(),
                    ))
                } else {
                    ChunkOutcome::Pending {
                        received: occupied.get().received_len(),
                        total_chunks,
                    }
                }
            }
            Entry::Vacant(vacant) => {
                if body.len() > limit.get() {
                    return Err(reject(sender, RejectReason::TooLarge {
                        attempted: body.len(),
                        limit,
                    }));
                }
                if total_chunks == 1 {
                    ChunkOutcome::Complete(CompletedTransfer::new(sender, 1, body))
                } else {
                    if in_flight >= self.config.max_in_flight.get() {
                        return Err(reject(sender, RejectReason::CapacityExhausted {
                            limit: self.config.max_in_flight,
                        }));
                    }
                    let mut state = TransferState::new(total_chunks, now);
                    state.insert(index, body, now);
                    vacant.insert(state);
                    ChunkOutcome::Pending {
                        received: 1,
                        total_chunks,
                    }
                }
            }
        };

        if let ChunkOutcome::Complete(done) = &outcome {
            metrics::record_transfer(TransferOutcome::Completed);
            debug!(%sender, total_chunks, len = done.payload().len(), "transfer complete");
        }
        metrics::set_transfers_in_flight(self.transfers.len());
        Ok(outcome)
    }

    /// Remove any transfers that exceeded the staleness timeout.
    ///
    /// Returns the senders whose transfers were evicted.
    pub fn purge_expired(&mut self) -> Vec<SenderId> { self.purge_expired_at(Instant::now()) }

    /// Remove any transfers that exceeded the staleness timeout using an
    /// explicit clock reading.
    ///
    /// A transfer is stale once no new chunk has arrived for
    /// `reassembly_timeout`. Returns the senders whose transfers were evicted.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<SenderId> {
        let mut evicted = Vec::new();
        let timeout = self.config.reassembly_timeout;

        self.transfers.retain(|sender, state| {
            let expired = state.is_stale(now, timeout);
            if expired {
                warn!(
                    %sender,
                    received = state.received_len(),
                    total_chunks = state.total_chunks(),
                    age_ms = u64::try_from(state.age(now).as_millis()).unwrap_or(u64::MAX),
                    "evicting stalled transfer"
                );
                evicted.push(*sender);
            }
            !expired
        });

        if !evicted.is_empty() {
            for _ in &evicted {
                metrics::record_transfer(TransferOutcome::Evicted);
            }
            metrics::set_transfers_in_flight(self.transfers.len());
        }
        evicted
    }

    /// Number of transfers currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.transfers.len() }

    /// Total chunk bytes held across all buffered transfers.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.transfers.values().map(TransferState::buffered_bytes).sum()
    }

    /// Received and declared chunk counts for `sender`'s transfer, if any.
    #[must_use]
    pub fn progress(&self, sender: SenderId) -> Option<(u32, u32)> {
        self.transfers
            .get(&sender)
            .map(|state| (state.received_len(), state.total_chunks()))
    }

    fn validate(&self, sender: SenderId, header: ChunkHeader) -> Result<(), ReassemblyError> {
        let total_chunks = header.total_chunks();
        if total_chunks == 0 {
            return Err(reject(sender, RejectReason::ZeroChunks));
        }
        if total_chunks > self.config.max_chunks.get() {
            return Err(reject(sender, RejectReason::TooManyChunks {
                declared: total_chunks,
                limit: self.config.max_chunks,
            }));
        }
        if !header.is_in_range() {
            return Err(reject(sender, RejectReason::IndexOutOfRange {
                index: header.chunk_index(),
                total_chunks,
            }));
        }
        Ok(())
    }
}

fn reject(sender: SenderId, reason: RejectReason) -> ReassemblyError {
    metrics::record_transfer(TransferOutcome::Rejected);
    ReassemblyError::TransferRejected { sender, reason }
}
