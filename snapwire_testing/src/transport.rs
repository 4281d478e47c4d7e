//! In-memory datagram transport.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        Mutex as StdMutex,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use snapwire::transport::{DatagramRx, DatagramTx};
use tokio::sync::{Mutex, mpsc};

type Queue = mpsc::UnboundedSender<(Bytes, SocketAddr)>;
type DropRule = Arc<dyn Fn(usize) -> bool + Send + Sync>;

/// Create a receiver bound to `local` and the injector feeding it.
#[must_use]
pub fn memory_link(local: SocketAddr) -> (MemoryInjector, MemoryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryInjector { tx }, MemoryReceiver {
        rx: Mutex::new(rx),
        local,
    })
}

/// Delivers datagrams to a [`MemoryReceiver`].
#[derive(Clone, Debug)]
pub struct MemoryInjector {
    tx: Queue,
}

impl MemoryInjector {
    /// Deliver `datagram` as though it came from `origin`.
    ///
    /// Returns `false` if the receiver has been dropped.
    pub fn inject(&self, origin: SocketAddr, datagram: Bytes) -> bool {
        self.tx.send((datagram, origin)).is_ok()
    }

    /// Create a sender transport that delivers from `origin`.
    #[must_use]
    pub fn sender(&self, origin: SocketAddr) -> MemorySender {
        MemorySender {
            origin,
            tx: self.tx.clone(),
            attempts: AtomicUsize::new(0),
            drop_rule: None,
            held: None,
        }
    }
}

/// Receiving end of a [`memory_link`].
#[derive(Debug)]
pub struct MemoryReceiver {
    rx: Mutex<mpsc::UnboundedReceiver<(Bytes, SocketAddr)>>,
    local: SocketAddr,
}

#[async_trait]
impl DatagramRx for MemoryReceiver {
    async fn recv_datagram(&self) -> io::Result<(Bytes, SocketAddr)> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "all injectors dropped"))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { Ok(self.local) }
}

/// [`DatagramTx`] that delivers into a [`memory_link`], optionally losing or
/// holding back datagrams.
pub struct MemorySender {
    origin: SocketAddr,
    tx: Queue,
    attempts: AtomicUsize,
    drop_rule: Option<DropRule>,
    held: Option<StdMutex<Vec<Bytes>>>,
}

impl MemorySender {
    /// Silently lose every datagram whose zero-based send position satisfies
    /// `rule`.
    #[must_use]
    pub fn dropping(mut self, rule: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        self.drop_rule = Some(Arc::new(rule));
        self
    }

    /// Hold datagrams back until [`release_reversed`](Self::release_reversed).
    #[must_use]
    pub fn holding(mut self) -> Self {
        self.held = Some(StdMutex::default());
        self
    }

    /// Deliver held datagrams in reverse send order, returning how many were
    /// released.
    pub fn release_reversed(&self) -> usize {
        let Some(held) = &self.held else { return 0 };
        let drained: Vec<Bytes> = held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = drained.len();
        for datagram in drained.into_iter().rev() {
            let _ = self.tx.send((datagram, self.origin));
        }
        count
    }

    /// Origin address stamped on delivered datagrams.
    #[must_use]
    pub fn origin(&self) -> SocketAddr { self.origin }
}

#[async_trait]
impl DatagramTx for MemorySender {
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()> {
        let position = self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.drop_rule.as_ref().is_some_and(|rule| rule(position)) {
            return Ok(());
        }
        if let Some(held) = &self.held {
            held.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(datagram);
            return Ok(());
        }
        self.tx
            .send((datagram, self.origin))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "receiver dropped"))
    }
}
