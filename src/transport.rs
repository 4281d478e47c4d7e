//! Datagram transport seams.
//!
//! The protocol only needs two capabilities from its transport: sending one
//! datagram to a fixed peer and receiving one datagram together with its
//! origin. [`DatagramTx`] and [`DatagramRx`] model these so the fragmenter
//! and the dispatch loop can run over UDP in production and over in-memory
//! channels in tests.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;

/// Outbound half of a datagram transport.
///
/// Sends are fire-and-forget: `Ok(())` means the datagram left this host,
/// not that it was delivered.
#[async_trait]
pub trait DatagramTx: Send + Sync {
    /// Send a single datagram.
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()>;
}

/// Inbound half of a datagram transport.
///
/// Implementations must be cancellation-safe: dropping a pending
/// `recv_datagram()` future must not lose a datagram that was already
/// dequeued.
#[async_trait]
pub trait DatagramRx: Send + Sync {
    /// Wait for the next datagram and report where it came from.
    async fn recv_datagram(&self) -> io::Result<(Bytes, SocketAddr)>;

    /// Local address the transport is bound to, when it has one.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl<T: DatagramTx + ?Sized> DatagramTx for Arc<T> {
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()> {
        (**self).send_datagram(datagram).await
    }
}

#[async_trait]
impl<T: DatagramRx + ?Sized> DatagramRx for Arc<T> {
    async fn recv_datagram(&self) -> io::Result<(Bytes, SocketAddr)> {
        (**self).recv_datagram().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { (**self).local_addr() }
}

/// A UDP socket paired with the peer every datagram is sent to.
#[derive(Clone, Debug)]
pub struct UdpTarget {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

impl UdpTarget {
    /// Wrap an existing socket.
    #[must_use]
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self { Self { socket, peer } }

    /// Bind an ephemeral local socket of the peer's address family.
    ///
    /// # Errors
    ///
    /// Returns any [`io::Error`] raised while binding the socket.
    pub async fn connect(peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::new(Arc::new(socket), peer))
    }

    /// Address datagrams are sent to.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr { self.peer }
}

#[async_trait]
impl DatagramTx for UdpTarget {
    async fn send_datagram(&self, datagram: Bytes) -> io::Result<()> {
        let sent = self.socket.send_to(&datagram, self.peer).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {sent} of {} bytes", datagram.len()),
            ));
        }
        Ok(())
    }
}

/// Receiving UDP socket with a fixed-size receive buffer.
///
/// Datagrams longer than `max_datagram_size` are truncated by the kernel;
/// the buffer is sized one byte larger so truncation is detectable.
#[derive(Debug)]
pub struct UdpReceiver {
    socket: UdpSocket,
    buffer_len: usize,
}

impl UdpReceiver {
    /// Wrap a bound socket.
    #[must_use]
    pub fn new(socket: UdpSocket, max_datagram_size: usize) -> Self {
        Self {
            socket,
            buffer_len: max_datagram_size.saturating_add(1),
        }
    }

    /// Size of the receive buffer allocated per datagram.
    #[must_use]
    pub const fn buffer_len(&self) -> usize { self.buffer_len }
}

#[async_trait]
impl DatagramRx for UdpReceiver {
    async fn recv_datagram(&self) -> io::Result<(Bytes, SocketAddr)> {
        let mut buf = BytesMut::zeroed(self.buffer_len);
        let (len, origin) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf.freeze(), origin))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }
}
