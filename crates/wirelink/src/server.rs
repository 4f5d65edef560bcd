//! Server: accepts many inbound connections and fans their events out to
//! one shared handler.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use wirelink_protocol::CodecConfig;
use wirelink_transport::{DatagramListener, Listener, StreamListener, Transport};

use crate::connection::{Connection, codec_for};
use crate::error::WirelinkError;
use crate::handler::ServerHandler;

/// A server over a stream (TCP) listener.
pub type TcpServer<H> = Server<StreamListener, H>;

/// A server over a datagram (UDP) endpoint.
pub type UdpServer<H> = Server<DatagramListener, H>;

/// Binds a listener and wires every accepted transport to the same
/// handler.
///
/// The handler receives `on_connection_made` / `on_recv_message` /
/// `on_connection_lost` once per distinct connection; anything that must
/// be correlated across frames (sessions, player state) is the handler's
/// to track, keyed by [`Connection::id`]. Stream and datagram servers
/// share this type — the datagram listener simply yields its single
/// socket as the one accepted transport.
pub struct Server<L: Listener, H: ServerHandler> {
    handler: Arc<H>,
    config: CodecConfig,
    accept_task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
    _listener: PhantomData<L>,
}

impl<L: Listener, H: ServerHandler> Server<L, H> {
    /// Creates a server that will dispatch connection events to `handler`
    /// and frame messages with `config`.
    pub fn new(handler: Arc<H>, config: CodecConfig) -> Self {
        Self {
            handler,
            config,
            accept_task: None,
            local_addr: None,
            _listener: PhantomData,
        }
    }

    /// Binds to `host:port`, fires `on_start`, and spawns the accept
    /// loop. Calling `start` while already running is a no-op.
    ///
    /// # Errors
    ///
    /// [`TransportError::Bind`](wirelink_transport::TransportError) when
    /// the address cannot be bound.
    pub async fn start(&mut self, host: &str, port: u16) -> Result<(), WirelinkError> {
        if self.accept_task.is_some() {
            return Ok(());
        }
        let listener = L::bind(host, port).await?;
        self.local_addr = listener.local_addr();
        self.handler.on_start();
        self.accept_task = Some(tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.handler),
            self.config,
        )));
        Ok(())
    }

    /// Fires `on_stop`, then closes the listening socket and waits for it
    /// to fully release. Already-accepted connections are left running;
    /// each fires its own `on_connection_lost` when it closes. A server
    /// that is not running is a no-op.
    pub async fn stop(&mut self) {
        let Some(task) = self.accept_task.take() else {
            return;
        };
        self.handler.on_stop();
        task.abort();
        // The listener lives inside the task; awaiting the abort is what
        // guarantees the socket has been released.
        let _ = task.await;
        self.local_addr = None;
        tracing::info!("server stopped");
    }

    /// Whether the accept loop is running.
    pub fn running(&self) -> bool {
        self.accept_task.is_some()
    }

    /// The bound local address while running. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

async fn accept_loop<L: Listener, H: ServerHandler>(
    mut listener: L,
    handler: Arc<H>,
    config: CodecConfig,
) {
    loop {
        match listener.accept().await {
            Ok(transport) => {
                let codec = codec_for(transport.framing(), config);
                let conn = Connection::spawn(transport, codec, Arc::clone(&handler));
                tracing::debug!(id = %conn.id(), "connection accepted");
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
            }
        }
    }
}
