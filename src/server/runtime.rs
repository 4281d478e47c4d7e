//! Runtime control for [`SnapServer`].

use std::sync::Arc;

use futures::Future;
use tokio::{
    signal,
    sync::{Mutex, mpsc},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{Instrument, info, warn};

use super::{
    Bound,
    ServerError,
    SnapServer,
    dispatch::{ReceiveOptions, receive_loop},
    worker::{WorkerContext, worker_task},
};
use crate::reassembly::ReassemblyService;

impl SnapServer<Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use snapwire::{server::SnapServer, sink::DirectorySink};
    ///
    /// async fn try_run() {
    ///     SnapServer::new(DirectorySink::new("out"))
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Receive failures are retried with exponential back-off and do not
    /// surface as errors. The `Result` is kept for future fatal conditions.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown the receive loop stops, the workers drain the queue, the
    /// reassembly actor exits and pending sink writes finish before this
    /// returns. Incomplete transfers are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use snapwire::{server::SnapServer, sink::DirectorySink};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), snapwire::server::ServerError> {
    /// let server = SnapServer::new(DirectorySink::new("out"))
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join server task")
    ///     .expect("server run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Receive failures are retried with exponential back-off and do not
    /// surface as errors.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let SnapServer {
            workers,
            queue_capacity,
            max_datagram_size,
            reassembly,
            transfer_sink,
            text_sink,
            backoff,
            ready_tx,
            state: Bound { transport },
        } = self;
        let local_addr = transport.local_addr().ok();
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let handle = ReassemblyService::spawn(reassembly, transfer_sink, &tracker, queue_capacity);
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity.get());
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let context = WorkerContext {
            reassembly: handle,
            text_sink,
        };

        for id in 0..workers {
            tracker.spawn(worker_task(id, Arc::clone(&queue_rx), context.clone()).in_current_span());
        }
        // Workers hold the only remaining handles, so the actor exits after
        // they do.
        drop(context);

        let options = ReceiveOptions {
            shutdown: shutdown_token.clone(),
            backoff,
            max_datagram_size,
        };
        tracker.spawn(receive_loop(transport, queue_tx, options).in_current_span());

        // Signal readiness after all workers have been spawned.
        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("failed to send readiness signal: receiver dropped");
        }
        info!(?local_addr, workers, "server started");

        shutdown.await;
        shutdown_token.cancel();

        tracker.close();
        tracker.wait().await;
        info!(?local_addr, "server stopped");
        Ok(())
    }
}
