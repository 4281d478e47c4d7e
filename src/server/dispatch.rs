//! Receive loop feeding the worker queue.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{select, sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::BackoffConfig;
use crate::{
    metrics::{self, DatagramOutcome},
    reassembly::SenderId,
    transport::DatagramRx,
};

/// One received datagram awaiting a worker.
#[derive(Debug)]
pub(super) struct Datagram {
    pub(super) sender: SenderId,
    pub(super) bytes: Bytes,
}

pub(super) struct ReceiveOptions {
    pub shutdown: CancellationToken,
    pub backoff: BackoffConfig,
    pub max_datagram_size: usize,
}

/// Pull datagrams from `transport` and queue them for the workers.
///
/// Datagrams longer than `max_datagram_size` are dropped here. Receive
/// failures are retried with exponential back-off. The loop ends when
/// `shutdown` is cancelled or every worker has gone, dropping `queue` so the
/// workers drain what remains and exit.
pub(super) async fn receive_loop(
    transport: Arc<dyn DatagramRx>,
    queue: mpsc::Sender<Datagram>,
    options: ReceiveOptions,
) {
    let options = ReceiveOptions {
        backoff: options.backoff.normalized(),
        ..options
    };
    let mut delay = options.backoff.initial_delay;
    while let Some(next_delay) = receive_iteration(&*transport, &queue, &options, delay).await {
        delay = next_delay;
    }
    debug!("receive loop stopped");
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn receive_iteration(
    transport: &dyn DatagramRx,
    queue: &mpsc::Sender<Datagram>,
    options: &ReceiveOptions,
    delay: Duration,
) -> Option<Duration> {
    let received = select! {
        biased;

        () = options.shutdown.cancelled() => return None,
        res = transport.recv_datagram() => res,
    };

    match received {
        Ok((bytes, origin)) => {
            let sender = SenderId::from(origin);
            if bytes.len() > options.max_datagram_size {
                metrics::record_datagram(DatagramOutcome::Oversized);
                debug!(%sender, len = bytes.len(), "dropping oversized datagram");
                return Some(options.backoff.initial_delay);
            }
            select! {
                biased;

                () = options.shutdown.cancelled() => None,
                sent = queue.send(Datagram { sender, bytes }) => match sent {
                    Ok(()) => Some(options.backoff.initial_delay),
                    Err(_) => {
                        metrics::record_datagram(DatagramOutcome::Dropped);
                        warn!(%sender, "worker pool closed; stopping receive loop");
                        None
                    }
                },
            }
        }
        Err(e) => {
            let local_addr = transport.local_addr().ok();
            warn!(error = %e, ?local_addr, "receive error");
            sleep(delay).await;
            Some(options.backoff.next_delay(delay))
        }
    }
}
