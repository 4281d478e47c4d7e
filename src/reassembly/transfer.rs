//! Partial state for one in-flight transfer.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};

use crate::packet::ChunkIndex;

/// Chunks received so far for a single sender.
///
/// Keys are unique chunk indices inside `[0, total_chunks)`; the caller
/// validates the range before inserting.
#[derive(Debug)]
pub(super) struct TransferState {
    total_chunks: u32,
    received: BTreeMap<ChunkIndex, Bytes>,
    buffered_bytes: usize,
    started_at: Instant,
    last_activity: Instant,
}

impl TransferState {
    pub(super) fn new(total_chunks: u32, now: Instant) -> Self {
        Self {
            total_chunks,
            received: BTreeMap::new(),
            buffered_bytes: 0,
            started_at: now,
            last_activity: now,
        }
    }

    pub(super) const fn total_chunks(&self) -> u32 { self.total_chunks }

    pub(super) fn contains(&self, index: ChunkIndex) -> bool { self.received.contains_key(&index) }

    pub(super) const fn buffered_bytes(&self) -> usize { self.buffered_bytes }

    pub(super) fn received_len(&self) -> u32 {
        u32::try_from(self.received.len()).unwrap_or(u32::MAX)
    }

    pub(super) fn is_complete(&self) -> bool { self.received_len() == self.total_chunks }

    pub(super) fn insert(&mut self, index: ChunkIndex, body: Bytes, now: Instant) {
        self.buffered_bytes += body.len();
        self.received.insert(index, body);
        self.last_activity = now;
    }

    pub(super) fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= timeout
    }

    pub(super) fn age(&self, now: Instant) -> Duration { now.saturating_duration_since(self.started_at) }

    /// Concatenate the chunks in ascending index order.
    pub(super) fn into_payload(self) -> Bytes {
        if self.received.len() == 1 {
            return self.received.into_values().next().unwrap_or_default();
        }
        let mut payload = BytesMut::with_capacity(self.buffered_bytes);
        for body in self.received.into_values() {
            payload.extend_from_slice(&body);
        }
        payload.freeze()
    }
}
