//! A live binding between a codec, a transport, and a handler.
//!
//! Internally a connection is two tasks. The reader task owns the
//! transport's receive half and the receive buffer, feeds bytes through
//! the codec, and invokes the handler callbacks — so all callbacks for
//! one connection run sequentially, in wire order. The writer task owns
//! the send half and drains an unbounded outgoing queue, which is what
//! makes [`Connection::send`] synchronous and non-blocking for callers.
//!
//! The public [`Connection`] is a cheap clonable handle: callbacks
//! receive a reference to it, servers keep clones in their session maps,
//! and any clone can send or request disconnection.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::{mpsc, watch};
use wirelink_protocol::{
    CodecConfig, DatagramCodec, Frame, FrameCodec, Message, Registry, StreamCodec,
};
use wirelink_transport::{ConnectionId, Framing, Incoming, Transport, TransportReader, TransportWriter};

use crate::error::WirelinkError;
use crate::handler::ConnectionHandler;

/// Initial capacity of a connection's receive buffer.
const RECV_BUFFER_CAPACITY: usize = 64 * 1024;

/// Selects the framing strategy matching a transport.
pub(crate) fn codec_for(framing: Framing, config: CodecConfig) -> FrameCodec {
    match framing {
        Framing::Stream => FrameCodec::Stream(StreamCodec::new(config)),
        Framing::Datagram => FrameCodec::Datagram(DatagramCodec::new(config)),
    }
}

/// Lifecycle state of a connection.
///
/// `Disconnected` is terminal: a connection is created fresh for each
/// connect attempt and never reused after closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, transport not yet handed to the receive task.
    Connecting,
    /// Transport live; sends are accepted.
    Connected,
    /// Closed. Terminal.
    Disconnected,
}

/// One queued outbound write.
#[derive(Debug)]
struct Outgoing {
    data: Vec<u8>,
    peer: Option<SocketAddr>,
}

/// Handle to a live connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    codec: FrameCodec,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    shutdown: Arc<watch::Sender<bool>>,
    state: watch::Receiver<ConnectionState>,
    closed: watch::Receiver<bool>,
}

impl Connection {
    /// Wires `transport` to `handler` and spawns the reader and writer
    /// tasks. The returned handle (and every clone of it) controls the
    /// connection.
    pub(crate) fn spawn<T, H>(transport: T, codec: FrameCodec, handler: Arc<H>) -> Self
    where
        T: Transport,
        H: ConnectionHandler,
    {
        let peer = transport.peer_addr();
        let (reader, writer) = transport.split();

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (closed_tx, closed_rx) = watch::channel(false);

        let conn = Self {
            id: ConnectionId::next(),
            peer,
            codec,
            outgoing: outgoing_tx,
            shutdown: Arc::clone(&shutdown),
            state: state_rx,
            closed: closed_rx,
        };

        // Subscribe both tasks before the handle escapes, so a shutdown
        // requested immediately after spawn is never missed.
        let writer_stop = shutdown.subscribe();
        let reader_stop = shutdown.subscribe();
        tokio::spawn(write_loop(writer, outgoing_rx, shutdown, writer_stop));
        tokio::spawn(read_loop(
            reader, handler, conn.clone(), state_tx, closed_tx, reader_stop,
        ));
        conn
    }

    /// The connection's process-unique identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The remote peer, when the transport is bound to a single one.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Whether the connection is in the `Connected` state.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Packs one frame and queues it for the writer task.
    ///
    /// Never blocks: the unbounded queue absorbs the write, and the
    /// transport applies whatever buffering it has. No backpressure is
    /// applied at this layer.
    ///
    /// # Errors
    ///
    /// [`WirelinkError::NotConnected`] unless the connection is in the
    /// `Connected` state, or a pack error for out-of-range values.
    pub fn send(&self, msg_type: u64, payload: &[u8]) -> Result<(), WirelinkError> {
        self.enqueue(msg_type, payload, None)
    }

    /// Like [`send`](Self::send), addressed to an explicit peer.
    ///
    /// This is the reply path for datagram server endpoints, where one
    /// connection serves many peers and the destination comes from the
    /// `peer` argument of
    /// [`on_recv_message`](crate::ConnectionHandler::on_recv_message).
    pub fn send_to(
        &self,
        msg_type: u64,
        payload: &[u8],
        peer: SocketAddr,
    ) -> Result<(), WirelinkError> {
        self.enqueue(msg_type, payload, Some(peer))
    }

    /// Packs a registered message kind and sends it.
    pub fn send_message<M: Message>(
        &self,
        registry: &Registry,
        message: &M,
    ) -> Result<(), WirelinkError> {
        let (code, payload) = registry.pack_message(message)?;
        self.send(code, &payload)
    }

    fn enqueue(
        &self,
        msg_type: u64,
        payload: &[u8],
        peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        if !self.is_connected() {
            return Err(WirelinkError::NotConnected);
        }
        let data = self.codec.pack(msg_type, payload)?;
        self.outgoing
            .send(Outgoing { data, peer })
            .map_err(|_| WirelinkError::NotConnected)
    }

    /// Requests that the connection close.
    ///
    /// Idempotent: a connection that is already `Disconnected` is a
    /// no-op, and calling this concurrently with a peer-initiated close
    /// still yields exactly one `on_connection_lost`.
    pub fn disconnect(&self) {
        if self.state() == ConnectionState::Disconnected {
            return;
        }
        let _ = self.shutdown.send(true);
    }

    /// Resolves once the connection has fully closed — that is, after
    /// `on_connection_lost` has returned.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Resolves once the connection has left `Connecting`.
    pub(crate) async fn established(&self) {
        let mut state = self.state.clone();
        let _ = state
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await;
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

async fn read_loop<R, H>(
    mut reader: R,
    handler: Arc<H>,
    conn: Connection,
    state: watch::Sender<ConnectionState>,
    closed: watch::Sender<bool>,
    mut stop: watch::Receiver<bool>,
) where
    R: TransportReader,
    H: ConnectionHandler,
{
    state.send_replace(ConnectionState::Connected);
    handler.on_connection_made(&conn);
    tracing::debug!(id = %conn.id(), peer = ?conn.peer_addr(), "connection open");

    let mut buffer = BytesMut::with_capacity(RECV_BUFFER_CAPACITY);
    loop {
        tokio::select! {
            _ = stop.wait_for(|stop| *stop) => break,
            received = reader.recv() => match received {
                Ok(Some(incoming)) => deliver(&conn, handler.as_ref(), &mut buffer, incoming),
                Ok(None) => {
                    tracing::debug!(id = %conn.id(), "peer closed connection");
                    break;
                }
                Err(e) => {
                    tracing::debug!(id = %conn.id(), error = %e, "receive failed");
                    break;
                }
            }
        }
    }

    // Terminal state first, so sends from inside on_connection_lost fail
    // as NotConnected; then the single on_connection_lost call site; then
    // release closed() waiters.
    state.send_replace(ConnectionState::Disconnected);
    let _ = conn.shutdown.send(true);
    handler.on_connection_lost(&conn);
    let _ = closed.send(true);
    tracing::debug!(id = %conn.id(), "connection closed");
}

/// Feeds one received chunk through the connection's framing and hands
/// every complete frame to the handler.
fn deliver<H: ConnectionHandler>(
    conn: &Connection,
    handler: &H,
    buffer: &mut BytesMut,
    incoming: Incoming,
) {
    match conn.codec {
        FrameCodec::Stream(codec) => {
            buffer.extend_from_slice(&incoming.data);
            // Drain every complete frame before the next read; the
            // unconsumed remainder stays in the buffer.
            while let Some(frame) = codec.unpack(buffer) {
                dispatch(conn, handler, frame, None);
            }
        }
        FrameCodec::Datagram(codec) => match codec.unpack(&incoming.data) {
            Ok(frame) => dispatch(conn, handler, frame, incoming.peer),
            Err(e) => {
                tracing::warn!(id = %conn.id(), error = %e, "dropping malformed datagram");
            }
        },
    }
}

fn dispatch<H: ConnectionHandler>(
    conn: &Connection,
    handler: &H,
    frame: Frame,
    peer: Option<SocketAddr>,
) {
    let msg_type = frame.msg_type;
    if let Err(e) = handler.on_recv_message(conn, frame, peer) {
        tracing::error!(id = %conn.id(), msg_type, error = %e, "message handler failed");
    }
}

// ---------------------------------------------------------------------------
// Writer task
// ---------------------------------------------------------------------------

async fn write_loop<W>(
    mut writer: W,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    shutdown: Arc<watch::Sender<bool>>,
    mut stop: watch::Receiver<bool>,
) where
    W: TransportWriter,
{
    loop {
        tokio::select! {
            _ = async { let _ = stop.wait_for(|stop| *stop).await; } => {
                // Flush whatever was queued before the close request.
                while let Ok(item) = outgoing.try_recv() {
                    if writer.send(&item.data, item.peer).await.is_err() {
                        break;
                    }
                }
                break;
            }
            item = outgoing.recv() => match item {
                Some(Outgoing { data, peer }) => {
                    if let Err(e) = writer.send(&data, peer).await {
                        tracing::debug!(error = %e, "send failed");
                        let _ = shutdown.send(true);
                        break;
                    }
                }
                None => break,
            }
        }
    }
    let _ = writer.close().await;
}
