//! Worker tasks decoding and routing queued datagrams.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error};

use super::dispatch::Datagram;
use crate::{
    metrics::{self, DatagramOutcome},
    packet::{Packet, PacketError},
    panic::format_panic,
    reassembly::ReassemblyHandle,
    sink::TextSink,
};

/// Queue shared by every worker; each datagram is taken by exactly one.
pub(super) type SharedQueue = Arc<Mutex<mpsc::Receiver<Datagram>>>;

/// Routing targets handed to each worker.
#[derive(Clone)]
pub(super) struct WorkerContext {
    pub reassembly: ReassemblyHandle,
    pub text_sink: Arc<dyn TextSink>,
}

/// Process datagrams until the queue is closed and drained.
///
/// A panic while handling one datagram is logged and the worker carries on
/// with the next.
pub(super) async fn worker_task(id: usize, queue: SharedQueue, context: WorkerContext) {
    loop {
        let next = { queue.lock().await.recv().await };
        let Some(datagram) = next else { break };
        let sender = datagram.sender;
        let handled = AssertUnwindSafe(handle_datagram(&context, datagram))
            .catch_unwind()
            .await;
        if let Err(panic) = handled {
            let panic_msg = format_panic(panic);
            error!(worker = id, %sender, panic = %panic_msg, "datagram handler panicked");
        }
    }
    debug!(worker = id, "worker stopped");
}

/// Decode one datagram and route it.
///
/// Malformed datagrams and unknown kinds are dropped without touching any
/// transfer state.
pub(super) async fn handle_datagram(context: &WorkerContext, datagram: Datagram) {
    let Datagram { sender, bytes } = datagram;
    let len = bytes.len();
    match Packet::decode(bytes) {
        Ok(packet @ Packet::Text(_)) => {
            let text = packet.text_lossy().unwrap_or_default();
            context.text_sink.deliver(sender, &text);
            metrics::inc_text_received();
            metrics::record_datagram(DatagramOutcome::Accepted);
        }
        Ok(Packet::ImageChunk { header, body }) => {
            // The reassembly actor labels chunks it receives.
            if context.reassembly.push(sender, header, body).await.is_err() {
                metrics::record_datagram(DatagramOutcome::Dropped);
                debug!(%sender, "reassembly service stopped; chunk dropped");
            }
        }
        Err(err @ PacketError::UnknownKind { .. }) => {
            metrics::record_datagram(DatagramOutcome::UnknownKind);
            debug!(%sender, len, error = %err, "dropping datagram");
        }
        Err(err @ PacketError::Malformed { .. }) => {
            metrics::record_datagram(DatagramOutcome::Malformed);
            debug!(%sender, len, error = %err, "dropping datagram");
        }
    }
}
