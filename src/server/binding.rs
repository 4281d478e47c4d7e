//! Transport binding for [`SnapServer`].

use std::{
    net::{SocketAddr, UdpSocket as StdUdpSocket},
    sync::Arc,
};

use tokio::net::UdpSocket;

use super::{Bound, ServerError, SnapServer, Unbound};
use crate::transport::{DatagramRx, UdpReceiver};

impl SnapServer<Unbound> {
    /// Set the largest datagram the server accepts.
    ///
    /// Longer datagrams are dropped by the receive loop. This also sizes the
    /// receive buffer of sockets bound afterwards, so it is only available
    /// before binding. Reassembly limits do not depend on it: peers may use
    /// any smaller budget.
    #[must_use]
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;
        self
    }

    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind a UDP socket to `addr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use snapwire::{server::SnapServer, sink::DirectorySink};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    /// let server = SnapServer::new(DirectorySink::new("out"))
    ///     .bind(addr)
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if binding or configuring the socket
    /// fails.
    pub fn bind(self, addr: SocketAddr) -> Result<SnapServer<Bound>, ServerError> {
        let socket = StdUdpSocket::bind(addr).map_err(ServerError::Bind)?;
        self.bind_existing_socket(socket)
    }

    /// Adopt an already bound standard library socket.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the socket cannot be registered with
    /// the runtime.
    pub fn bind_existing_socket(
        self,
        socket: StdUdpSocket,
    ) -> Result<SnapServer<Bound>, ServerError> {
        socket.set_nonblocking(true).map_err(ServerError::Bind)?;
        let socket = UdpSocket::from_std(socket).map_err(ServerError::Bind)?;
        let receiver = UdpReceiver::new(socket, self.max_datagram_size);
        Ok(self.bind_transport(Arc::new(receiver)))
    }

    /// Receive from an arbitrary datagram transport.
    ///
    /// Used to run the server over in-memory transports in tests.
    #[must_use]
    pub fn bind_transport(self, transport: Arc<dyn DatagramRx>) -> SnapServer<Bound> {
        let SnapServer {
            workers,
            queue_capacity,
            max_datagram_size,
            reassembly,
            transfer_sink,
            text_sink,
            backoff,
            ready_tx,
            state: Unbound,
        } = self;
        SnapServer {
            workers,
            queue_capacity,
            max_datagram_size,
            reassembly,
            transfer_sink,
            text_sink,
            backoff,
            ready_tx,
            state: Bound { transport },
        }
    }
}

impl SnapServer<Bound> {
    /// Returns the bound address, or `None` if the transport cannot report
    /// one.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.transport.local_addr().ok() }
}
