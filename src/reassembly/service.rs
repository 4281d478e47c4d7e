//! Actor wrapper that serialises access to a [`Reassembler`].
//!
//! Workers never touch the transfer table directly. They send commands to a
//! single task which owns the reassembler, so completion detection for a
//! sender is atomic without a lock. The same task runs the eviction sweep
//! and hands completed payloads to the sink on tracked background tasks.

use std::{num::NonZeroUsize, sync::Arc};

use bytes::Bytes;
use thiserror::Error;
use tokio::{
    select,
    sync::{mpsc, oneshot},
    time::{self, MissedTickBehavior},
};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, warn};

use super::{ChunkOutcome, CompletedTransfer, Reassembler, ReassemblyConfig, SenderId};
use crate::{
    metrics::{self, DatagramOutcome},
    packet::ChunkHeader,
    sink::TransferSink,
};

/// Returned when the reassembly actor is no longer running.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("reassembly service has stopped")]
pub struct ServiceClosed;

/// Point-in-time view of the transfer table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Transfers currently being collected.
    pub in_flight: usize,
    /// Chunk bytes buffered across those transfers.
    pub buffered_bytes: usize,
}

enum Command {
    Chunk {
        sender: SenderId,
        header: ChunkHeader,
        body: Bytes,
    },
    Stats(oneshot::Sender<ReassemblyStats>),
}

/// Cloneable handle used to feed chunks to the reassembly actor.
///
/// The actor exits once every handle has been dropped and the queued
/// commands have been drained.
#[derive(Clone, Debug)]
pub struct ReassemblyHandle {
    tx: mpsc::Sender<Command>,
}

impl ReassemblyHandle {
    /// Queue a chunk for reassembly, waiting for space if the actor is busy.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceClosed`] if the actor has stopped.
    pub async fn push(
        &self,
        sender: SenderId,
        header: ChunkHeader,
        body: Bytes,
    ) -> Result<(), ServiceClosed> {
        self.tx
            .send(Command::Chunk {
                sender,
                header,
                body,
            })
            .await
            .map_err(|_| ServiceClosed)
    }

    /// Ask the actor for its current table statistics.
    ///
    /// Returns `None` if the actor stopped before answering.
    pub async fn stats(&self) -> Option<ReassemblyStats> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(Command::Stats(tx)).await.ok()?;
        rx.await.ok()
    }
}

/// Spawns the reassembly actor.
#[derive(Debug)]
pub struct ReassemblyService;

impl ReassemblyService {
    /// Start an actor owning a [`Reassembler`] built from `config`.
    ///
    /// The actor and every sink write it starts are spawned on `tracker`, so
    /// waiting on the tracker after dropping all handles drains pending
    /// saves. `capacity` bounds the command queue.
    #[must_use]
    pub fn spawn(
        config: ReassemblyConfig,
        sink: Arc<dyn TransferSink>,
        tracker: &TaskTracker,
        capacity: NonZeroUsize,
    ) -> ReassemblyHandle {
        let (tx, rx) = mpsc::channel(capacity.get());
        let actor = Actor {
            reassembler: Reassembler::new(config),
            sink,
            tracker: tracker.clone(),
        };
        tracker.spawn(actor.run(rx).in_current_span());
        ReassemblyHandle { tx }
    }
}

struct Actor {
    reassembler: Reassembler,
    sink: Arc<dyn TransferSink>,
    tracker: TaskTracker,
}

impl Actor {
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        let period = self.reassembler.config().sweep_interval;
        let mut sweep = time::interval_at(time::Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = sweep.tick() => {
                    let evicted = self.reassembler.purge_expired_at(now());
                    if !evicted.is_empty() {
                        debug!(count = evicted.len(), "sweep evicted stalled transfers");
                    }
                }
            }
        }
        debug!(
            in_flight = self.reassembler.buffered_len(),
            "reassembly service stopped"
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Chunk {
                sender,
                header,
                body,
            } => match self.reassembler.push_at(sender, header, body, now()) {
                Ok(ChunkOutcome::Complete(transfer)) => {
                    metrics::record_datagram(DatagramOutcome::Accepted);
                    self.deliver(transfer);
                }
                Ok(ChunkOutcome::Pending {
                    received,
                    total_chunks,
                }) => {
                    metrics::record_datagram(DatagramOutcome::Accepted);
                    debug!(%sender, received, total_chunks, "chunk buffered");
                }
                Ok(ChunkOutcome::Duplicate) => {
                    metrics::record_datagram(DatagramOutcome::Duplicate);
                }
                Err(err) => {
                    metrics::record_datagram(DatagramOutcome::Rejected);
                    warn!(error = %err, "chunk rejected");
                }
            },
            Command::Stats(reply) => {
                let _ = reply.send(ReassemblyStats {
                    in_flight: self.reassembler.buffered_len(),
                    buffered_bytes: self.reassembler.buffered_bytes(),
                });
            }
        }
    }

    fn deliver(&self, transfer: CompletedTransfer) {
        let sink = Arc::clone(&self.sink);
        let sender = transfer.sender();
        info!(
            %sender,
            total_chunks = transfer.total_chunks(),
            len = transfer.payload().len(),
            "transfer reassembled"
        );
        self.tracker.spawn(
            async move {
                if let Err(err) = sink.save(sender, transfer.into_payload()).await {
                    warn!(%sender, error = %err, "failed to persist transfer");
                }
            }
            .in_current_span(),
        );
    }
}

/// Current time from tokio's clock so paused-time tests drive eviction.
fn now() -> std::time::Instant { time::Instant::now().into_std() }
