//! Integration tests for the stream (TCP) path: a real server and client
//! exchanging frames over loopback sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use wirelink::prelude::*;

// =========================================================================
// Recording handler
// =========================================================================

#[derive(Debug)]
enum Event {
    Made(ConnectionId),
    Message {
        msg_type: u64,
        payload: Vec<u8>,
    },
    Lost(ConnectionId),
}

/// Forwards every callback into a channel the test can await.
struct Recorder {
    events: mpsc::UnboundedSender<Event>,
}

impl Recorder {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { events: tx }), rx)
    }
}

impl ConnectionHandler for Recorder {
    fn on_connection_made(&self, conn: &Connection) {
        let _ = self.events.send(Event::Made(conn.id()));
    }

    fn on_recv_message(
        &self,
        _conn: &Connection,
        frame: Frame,
        _peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        let _ = self.events.send(Event::Message {
            msg_type: frame.msg_type,
            payload: frame.payload.to_vec(),
        });
        Ok(())
    }

    fn on_connection_lost(&self, conn: &Connection) {
        let _ = self.events.send(Event::Lost(conn.id()));
    }
}

impl ServerHandler for Recorder {}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn start_server(handler: Arc<Recorder>) -> (TcpServer<Recorder>, SocketAddr) {
    let mut server = TcpServer::new(handler, CodecConfig::default());
    server.start("127.0.0.1", 0).await.expect("server should start");
    let addr = server.local_addr().expect("server should know its address");
    (server, addr)
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_connection_lifecycle() {
    let (server_handler, mut server_events) = Recorder::new();
    let (mut server, addr) = start_server(server_handler).await;

    let (client_handler, mut client_events) = Recorder::new();
    let mut client = TcpClient::new(client_handler, CodecConfig::default());
    client
        .connect("127.0.0.1", addr.port())
        .await
        .expect("client should connect");
    assert!(client.connected());

    // on_connection_made fires on both sides before any message.
    assert!(matches!(next_event(&mut client_events).await, Event::Made(_)));
    let server_side = match next_event(&mut server_events).await {
        Event::Made(id) => id,
        other => panic!("expected Made, got {other:?}"),
    };

    client.send(1, b"ping").expect("send should succeed");
    match next_event(&mut server_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!(msg_type, 1);
            assert_eq!(payload, b"ping");
        }
        other => panic!("expected Message, got {other:?}"),
    }

    client.disconnect().await;
    assert!(!client.connected());

    // The client observed its own on_connection_lost before disconnect()
    // returned.
    assert!(matches!(next_event(&mut client_events).await, Event::Lost(_)));

    // The server sees exactly one Lost for that connection, and nothing
    // after it.
    match next_event(&mut server_events).await {
        Event::Lost(id) => assert_eq!(id, server_side),
        other => panic!("expected Lost, got {other:?}"),
    }
    let extra = tokio::time::timeout(Duration::from_millis(200), server_events.recv()).await;
    assert!(extra.is_err(), "no further server events expected, got {extra:?}");

    server.stop().await;
}

#[tokio::test]
async fn test_send_without_connection_fails() {
    let (handler, _events) = Recorder::new();
    let client = TcpClient::new(handler, CodecConfig::default());
    assert!(matches!(
        client.send(1, b"x").unwrap_err(),
        WirelinkError::NotConnected
    ));
}

#[tokio::test]
async fn test_send_after_disconnect_fails() {
    let (server_handler, _server_events) = Recorder::new();
    let (mut server, addr) = start_server(server_handler).await;

    let (client_handler, _client_events) = Recorder::new();
    let mut client = TcpClient::new(client_handler, CodecConfig::default());
    client.connect("127.0.0.1", addr.port()).await.expect("connect");
    client.disconnect().await;

    assert!(matches!(
        client.send(1, b"x").unwrap_err(),
        WirelinkError::NotConnected
    ));
    server.stop().await;
}

#[tokio::test]
async fn test_connect_refused_surfaces_transport_error() {
    // Bind-then-drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let (handler, _events) = Recorder::new();
    let mut client = TcpClient::new(handler, CodecConfig::default());
    let err = client
        .connect("127.0.0.1", port)
        .await
        .expect_err("connect should fail");
    assert!(matches!(
        err,
        WirelinkError::Transport(TransportError::Connect(_))
    ));
    assert!(!client.connected());
}

// =========================================================================
// Framing over a real socket
// =========================================================================

#[tokio::test]
async fn test_batched_and_fragmented_frames() {
    let (server_handler, mut server_events) = Recorder::new();
    let (mut server, addr) = start_server(server_handler).await;

    let codec = StreamCodec::new(CodecConfig::default());
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    assert!(matches!(next_event(&mut server_events).await, Event::Made(_)));

    // Two frames in a single write arrive as two messages, in order.
    let mut batch = codec.pack(1, b"a").expect("pack");
    batch.extend_from_slice(&codec.pack(2, b"bb").expect("pack"));
    stream.write_all(&batch).await.expect("write");

    match next_event(&mut server_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!((msg_type, payload.as_slice()), (1, &b"a"[..]));
        }
        other => panic!("expected Message, got {other:?}"),
    }
    match next_event(&mut server_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!((msg_type, payload.as_slice()), (2, &b"bb"[..]));
        }
        other => panic!("expected Message, got {other:?}"),
    }

    // One frame split across two writes arrives whole once complete.
    let wire = codec.pack(3, b"hello").expect("pack");
    stream.write_all(&wire[..2]).await.expect("write");
    stream.flush().await.expect("flush");
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(&wire[2..]).await.expect("write");

    match next_event(&mut server_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!((msg_type, payload.as_slice()), (3, &b"hello"[..]));
        }
        other => panic!("expected Message, got {other:?}"),
    }

    // Zero-length payloads are valid frames.
    stream
        .write_all(&codec.pack(4, b"").expect("pack"))
        .await
        .expect("write");
    match next_event(&mut server_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!(msg_type, 4);
            assert!(payload.is_empty());
        }
        other => panic!("expected Message, got {other:?}"),
    }

    server.stop().await;
}

// =========================================================================
// Server push and lifecycle hooks
// =========================================================================

/// Echoes every frame straight back on the same connection.
struct Echo;

impl ConnectionHandler for Echo {
    fn on_connection_made(&self, _conn: &Connection) {}

    fn on_recv_message(
        &self,
        conn: &Connection,
        frame: Frame,
        _peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        conn.send(frame.msg_type, &frame.payload)
    }

    fn on_connection_lost(&self, _conn: &Connection) {}
}

impl ServerHandler for Echo {}

#[tokio::test]
async fn test_server_echoes_to_client() {
    let mut server = TcpServer::new(Arc::new(Echo), CodecConfig::default());
    server.start("127.0.0.1", 0).await.expect("start");
    let addr = server.local_addr().expect("addr");

    let (client_handler, mut client_events) = Recorder::new();
    let mut client = TcpClient::new(client_handler, CodecConfig::default());
    client.connect("127.0.0.1", addr.port()).await.expect("connect");
    assert!(matches!(next_event(&mut client_events).await, Event::Made(_)));

    client.send(7, b"marco").expect("send");
    match next_event(&mut client_events).await {
        Event::Message { msg_type, payload } => {
            assert_eq!((msg_type, payload.as_slice()), (7, &b"marco"[..]));
        }
        other => panic!("expected Message, got {other:?}"),
    }

    client.disconnect().await;
    server.stop().await;
}

/// Counts on_start/on_stop invocations.
struct Hooks {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ConnectionHandler for Hooks {
    fn on_connection_made(&self, _conn: &Connection) {}

    fn on_recv_message(
        &self,
        _conn: &Connection,
        _frame: Frame,
        _peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        Ok(())
    }

    fn on_connection_lost(&self, _conn: &Connection) {}
}

impl ServerHandler for Hooks {
    fn on_start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_server_start_stop_idempotent() {
    let hooks = Arc::new(Hooks {
        starts: AtomicUsize::new(0),
        stops: AtomicUsize::new(0),
    });
    let mut server = TcpServer::new(Arc::clone(&hooks), CodecConfig::default());

    server.start("127.0.0.1", 0).await.expect("start");
    assert!(server.running());
    let addr = server.local_addr().expect("addr");

    // Second start is a no-op: same socket, no second on_start.
    server.start("127.0.0.1", 0).await.expect("restart no-op");
    assert_eq!(server.local_addr(), Some(addr));
    assert_eq!(hooks.starts.load(Ordering::SeqCst), 1);

    server.stop().await;
    assert!(!server.running());
    assert_eq!(server.local_addr(), None);
    assert_eq!(hooks.stops.load(Ordering::SeqCst), 1);

    // Second stop is a no-op.
    server.stop().await;
    assert_eq!(hooks.stops.load(Ordering::SeqCst), 1);

    // The port was fully released; a fresh start works.
    server.start("127.0.0.1", addr.port()).await.expect("start again");
    assert_eq!(hooks.starts.load(Ordering::SeqCst), 2);
    server.stop().await;
}
