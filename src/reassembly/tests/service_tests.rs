//! Tests for the reassembly actor, its sweep and sink hand-off.

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing_test::traced_test;

use super::support::{chunks, counting_payload, header, sender, small_config, small_fragmentation};
use crate::{
    reassembly::{ReassemblyHandle, ReassemblyService, ReassemblyStats, SenderId},
    sink::{SinkError, TransferSink},
};

/// Forwards completed transfers to a channel.
struct ChannelSink(mpsc::UnboundedSender<(SenderId, Bytes)>);

#[async_trait]
impl TransferSink for ChannelSink {
    async fn save(&self, sender: SenderId, payload: Bytes) -> Result<(), SinkError> {
        self.0
            .send((sender, payload))
            .map_err(|_| SinkError::Rejected("receiver dropped".to_owned()))
    }
}

struct FailingSink;

#[async_trait]
impl TransferSink for FailingSink {
    async fn save(&self, _sender: SenderId, _payload: Bytes) -> Result<(), SinkError> {
        Err(SinkError::Rejected("disk full".to_owned()))
    }
}

struct Harness {
    handle: ReassemblyHandle,
    tracker: TaskTracker,
    saved: mpsc::UnboundedReceiver<(SenderId, Bytes)>,
}

impl Harness {
    /// Drop the handle and wait for the actor and pending saves to finish.
    async fn finish(self) -> Vec<(SenderId, Bytes)> {
        let Self {
            handle,
            tracker,
            mut saved,
        } = self;
        drop(handle);
        tracker.close();
        tracker.wait().await;
        let mut out = Vec::new();
        while let Ok(item) = saved.try_recv() {
            out.push(item);
        }
        out
    }
}

fn capacity() -> NonZeroUsize { NonZeroUsize::new(16).expect("non-zero") }

#[fixture]
fn harness() -> Harness {
    let (tx, saved) = mpsc::unbounded_channel();
    let tracker = TaskTracker::new();
    let handle = ReassemblyService::spawn(
        small_config().with_timeout(Duration::from_secs(30)),
        Arc::new(ChannelSink(tx)),
        &tracker,
        capacity(),
    );
    Harness {
        handle,
        tracker,
        saved,
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn duplicate_chunk_saves_once(harness: Harness) {
    let payload = counting_payload(250);
    let parts = chunks(small_fragmentation(), &payload);
    for i in [1, 1, 0, 2] {
        let (header, body) = parts.get(i).cloned().expect("chunk");
        harness
            .handle
            .push(sender(1), header, body)
            .await
            .expect("service running");
    }

    let saved = harness.finish().await;

    assert_eq!(saved.len(), 1);
    let (from, bytes) = saved.first().expect("one save");
    assert_eq!(*from, sender(1));
    assert_eq!(bytes.as_ref(), payload.as_slice());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stats_report_in_flight_transfers(harness: Harness) {
    harness
        .handle
        .push(sender(1), header(3, 0), Bytes::from_static(b"abc"))
        .await
        .expect("service running");

    let stats = harness.handle.stats().await.expect("actor answers");

    assert_eq!(stats, ReassemblyStats {
        in_flight: 1,
        buffered_bytes: 3,
    });
    assert!(harness.finish().await.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn sweep_evicts_stalled_transfer(harness: Harness) {
    harness
        .handle
        .push(sender(1), header(3, 0), Bytes::from_static(b"a"))
        .await
        .expect("service running");

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(harness.handle.stats().await.map(|s| s.in_flight), Some(1));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.handle.stats().await.map(|s| s.in_flight), Some(0));

    // Late chunks for the evicted transfer start over rather than complete.
    for i in [1, 2] {
        harness
            .handle
            .push(sender(1), header(3, i), Bytes::from_static(b"z"))
            .await
            .expect("service running");
    }
    assert!(harness.finish().await.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rejected_transfer_never_reaches_sink(harness: Harness) {
    harness
        .handle
        .push(sender(1), header(11, 0), Bytes::from_static(b"x"))
        .await
        .expect("service running");

    assert_eq!(harness.handle.stats().await.map(|s| s.in_flight), Some(0));
    assert!(harness.finish().await.is_empty());
}

#[traced_test]
#[tokio::test]
async fn sink_failure_is_logged_not_fatal() {
    let tracker = TaskTracker::new();
    let handle = ReassemblyService::spawn(small_config(), Arc::new(FailingSink), &tracker, capacity());

    handle
        .push(sender(1), header(1, 0), Bytes::from_static(b"x"))
        .await
        .expect("service running");
    handle
        .push(sender(2), header(1, 0), Bytes::from_static(b"y"))
        .await
        .expect("service survives sink failure");
    drop(handle);
    tracker.close();
    tracker.wait().await;

    assert!(logs_contain("failed to persist transfer"));
    assert!(logs_contain("disk full"));
}

#[tokio::test]
async fn cloned_handles_keep_actor_alive() {
    let (tx, _saved) = mpsc::unbounded_channel();
    let tracker = TaskTracker::new();
    let handle = ReassemblyService::spawn(small_config(), Arc::new(ChannelSink(tx)), &tracker, capacity());
    let probe = handle.clone();
    drop(handle);

    assert!(probe.stats().await.is_some());
    assert!(
        probe
            .push(sender(1), header(1, 0), Bytes::new())
            .await
            .is_ok()
    );
}
