//! TCP stream transport.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::{Connector, Framing, Incoming, Listener, Transport, TransportError, TransportReader, TransportWriter};

/// How much to ask the socket for per read.
const READ_CHUNK: usize = 64 * 1024;

/// A connected TCP stream.
pub struct TcpTransport {
    stream: TcpStream,
    peer: Option<SocketAddr>,
}

impl TcpTransport {
    /// Wraps an already-connected stream (the server accept path).
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        Self { stream, peer }
    }
}

impl Transport for TcpTransport {
    type Reader = TcpReader;
    type Writer = TcpWriter;

    fn framing(&self) -> Framing {
        Framing::Stream
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn split(self) -> (TcpReader, TcpWriter) {
        let (read, write) = self.stream.into_split();
        (TcpReader { half: read }, TcpWriter { half: write })
    }
}

impl Connector for TcpTransport {
    async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(TransportError::Connect)?;
        Ok(Self::from_stream(stream))
    }
}

/// Receiving half of a [`TcpTransport`].
pub struct TcpReader {
    half: OwnedReadHalf,
}

impl TransportReader for TcpReader {
    async fn recv(&mut self) -> Result<Option<Incoming>, TransportError> {
        let mut data = vec![0u8; READ_CHUNK];
        let n = self
            .half
            .read(&mut data)
            .await
            .map_err(TransportError::Recv)?;
        if n == 0 {
            return Ok(None);
        }
        data.truncate(n);
        Ok(Some(Incoming { data, peer: None }))
    }
}

/// Sending half of a [`TcpTransport`].
pub struct TcpWriter {
    half: OwnedWriteHalf,
}

impl TransportWriter for TcpWriter {
    async fn send(&mut self, data: &[u8], _peer: Option<SocketAddr>) -> Result<(), TransportError> {
        self.half
            .write_all(data)
            .await
            .map_err(TransportError::Send)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.half.shutdown().await.map_err(TransportError::Send)
    }
}

/// A listening TCP socket producing one [`TcpTransport`] per accepted
/// peer.
pub struct StreamListener {
    listener: TcpListener,
    local: Option<SocketAddr>,
}

impl Listener for StreamListener {
    type Transport = TcpTransport;

    async fn bind(host: &str, port: u16) -> Result<Self, TransportError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(TransportError::Bind)?;
        let local = listener.local_addr().ok();
        tracing::info!(addr = ?local, "stream listener bound");
        Ok(Self { listener, local })
    }

    async fn accept(&mut self) -> Result<TcpTransport, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        tracing::debug!(%addr, "accepted stream connection");
        Ok(TcpTransport::from_stream(stream))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local
    }
}
