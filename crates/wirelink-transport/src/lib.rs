//! Transport abstraction layer for Wirelink.
//!
//! Provides the [`Transport`], [`Connector`], and [`Listener`] traits that
//! abstract over the two socket families the message layer runs on:
//!
//! - **stream** (TCP) — ordered bytes with no record boundaries; frames
//!   need an explicit length prefix ([`Framing::Stream`])
//! - **datagram** (UDP) — each read is one whole packet; the packet
//!   boundary is the framing ([`Framing::Datagram`])
//!
//! A transport only moves bytes. Which framing those bytes use is
//! reported by [`Transport::framing`] so the connection machinery above
//! can pick the matching codec while sharing everything else.
//!
//! All trait futures are `Send` so connections can be driven from spawned
//! tasks regardless of the concrete transport.

mod error;
mod tcp;
mod udp;

pub use error::TransportError;
pub use tcp::{StreamListener, TcpReader, TcpTransport, TcpWriter};
pub use udp::{DatagramListener, UdpReader, UdpTransport, UdpWriter};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next process-unique ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which framing strategy a transport's bytes require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// No record boundaries; frames carry a length prefix.
    Stream,
    /// One read is one record; no length prefix.
    Datagram,
}

/// One chunk of received data.
///
/// For datagram transports `peer` carries the sender's address (a single
/// server-side socket receives from many peers); stream transports leave
/// it `None` since the peer is fixed per connection.
#[derive(Debug)]
pub struct Incoming {
    /// The received bytes. For streams, an arbitrary slice of the byte
    /// stream; for datagrams, exactly one whole datagram.
    pub data: Vec<u8>,
    /// The sending peer, when the socket is not bound to a single one.
    pub peer: Option<SocketAddr>,
}

/// A live transport endpoint that can be split into its two halves.
pub trait Transport: Send + Sized + 'static {
    /// The receiving half.
    type Reader: TransportReader;
    /// The sending half.
    type Writer: TransportWriter;

    /// The framing strategy this transport's bytes require.
    fn framing(&self) -> Framing;

    /// The remote peer, when the endpoint is bound to a single one.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Splits the endpoint into independently owned read and write halves.
    fn split(self) -> (Self::Reader, Self::Writer);
}

/// The receiving half of a transport.
pub trait TransportReader: Send + 'static {
    /// Waits for the next chunk of data.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly
    /// (stream EOF); datagram sockets never do.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Incoming>, TransportError>> + Send;
}

/// The sending half of a transport.
pub trait TransportWriter: Send + 'static {
    /// Sends `data`, to `peer` when given (datagram sockets serving many
    /// peers) or to the endpoint's fixed remote otherwise.
    fn send(
        &mut self,
        data: &[u8],
        peer: Option<SocketAddr>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Flushes and closes the sending side.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A transport that can establish outbound connections.
pub trait Connector: Transport {
    /// Performs the transport handshake with `host:port`, resolving the
    /// host if needed.
    fn connect(host: &str, port: u16)
    -> impl Future<Output = Result<Self, TransportError>> + Send;
}

/// A bound local endpoint that produces inbound transports.
pub trait Listener: Send + Sized + 'static {
    /// The transport type produced for each accepted peer.
    type Transport: Transport;

    /// Binds to `host:port` and starts listening.
    fn bind(host: &str, port: u16) -> impl Future<Output = Result<Self, TransportError>> + Send;

    /// Waits for and yields the next inbound transport.
    ///
    /// Datagram listeners yield their single socket once and then pend
    /// forever — one bound endpoint is one transport.
    fn accept(&mut self) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;

    /// The locally bound address, once known.
    fn local_addr(&self) -> Option<SocketAddr>;
}
