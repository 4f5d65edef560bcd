//! UDP datagram transport.
//!
//! A client-side endpoint is a socket `connect`ed to one remote, so it
//! only exchanges datagrams with that peer. A server-side endpoint is a
//! single bound socket that receives from many peers at once; the peer
//! address rides along with every received datagram and must be supplied
//! when replying.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::{Connector, Framing, Incoming, Listener, Transport, TransportError, TransportReader, TransportWriter};

/// Largest datagram we will receive. UDP cannot carry more.
const MAX_DATAGRAM: usize = 64 * 1024;

/// A UDP endpoint, either connected to one remote or bound for many.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    /// Wraps a bound socket (the server endpoint path).
    pub fn from_socket(socket: UdpSocket) -> Self {
        let peer = socket.peer_addr().ok();
        Self {
            socket: Arc::new(socket),
            peer,
        }
    }
}

impl Transport for UdpTransport {
    type Reader = UdpReader;
    type Writer = UdpWriter;

    fn framing(&self) -> Framing {
        Framing::Datagram
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn split(self) -> (UdpReader, UdpWriter) {
        let reader = UdpReader {
            socket: Arc::clone(&self.socket),
        };
        let writer = UdpWriter {
            socket: self.socket,
        };
        (reader, writer)
    }
}

impl Connector for UdpTransport {
    async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(TransportError::Bind)?;
        socket
            .connect((host, port))
            .await
            .map_err(TransportError::Connect)?;
        Ok(Self::from_socket(socket))
    }
}

/// Receiving half of a [`UdpTransport`].
pub struct UdpReader {
    socket: Arc<UdpSocket>,
}

impl TransportReader for UdpReader {
    async fn recv(&mut self) -> Result<Option<Incoming>, TransportError> {
        let mut data = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = self
            .socket
            .recv_from(&mut data)
            .await
            .map_err(TransportError::Recv)?;
        data.truncate(n);
        Ok(Some(Incoming {
            data,
            peer: Some(addr),
        }))
    }
}

/// Sending half of a [`UdpTransport`].
pub struct UdpWriter {
    socket: Arc<UdpSocket>,
}

impl TransportWriter for UdpWriter {
    async fn send(&mut self, data: &[u8], peer: Option<SocketAddr>) -> Result<(), TransportError> {
        match peer {
            Some(addr) => self.socket.send_to(data, addr).await,
            None => self.socket.send(data).await,
        }
        .map(|_| ())
        .map_err(TransportError::Send)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the socket releases it; UDP has nothing to flush.
        Ok(())
    }
}

/// A bound UDP endpoint.
///
/// Unlike a stream listener there is no per-peer socket to hand out:
/// [`accept`](Listener::accept) yields the bound socket exactly once and
/// then pends forever, so servers share one accept loop across both
/// socket families.
pub struct DatagramListener {
    socket: Option<UdpSocket>,
    local: Option<SocketAddr>,
}

impl Listener for DatagramListener {
    type Transport = UdpTransport;

    async fn bind(host: &str, port: u16) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((host, port))
            .await
            .map_err(TransportError::Bind)?;
        let local = socket.local_addr().ok();
        tracing::info!(addr = ?local, "datagram endpoint bound");
        Ok(Self {
            socket: Some(socket),
            local,
        })
    }

    async fn accept(&mut self) -> Result<UdpTransport, TransportError> {
        match self.socket.take() {
            Some(socket) => Ok(UdpTransport::from_socket(socket)),
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local
    }
}
