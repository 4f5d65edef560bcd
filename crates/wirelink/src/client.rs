//! Client: manages exactly one outbound connection's lifecycle.

use std::marker::PhantomData;
use std::sync::Arc;

use wirelink_protocol::{CodecConfig, Message, Registry};
use wirelink_transport::{Connector, TcpTransport, UdpTransport};

use crate::connection::{Connection, codec_for};
use crate::error::WirelinkError;
use crate::handler::ConnectionHandler;

/// A client over a stream (TCP) transport.
pub type TcpClient<H> = Client<TcpTransport, H>;

/// A client over a datagram (UDP) transport.
pub type UdpClient<H> = Client<UdpTransport, H>;

/// Owns one outbound [`Connection`] at a time and drives its lifecycle.
///
/// The client itself holds no message logic: every transport event lands
/// in the handler it was constructed with, typically a
/// [`RoutingHandler`](crate::RoutingHandler) or an application type
/// implementing [`ConnectionHandler`].
pub struct Client<T: Connector, H: ConnectionHandler> {
    handler: Arc<H>,
    config: CodecConfig,
    conn: Option<Connection>,
    _transport: PhantomData<T>,
}

impl<T: Connector, H: ConnectionHandler> Client<T, H> {
    /// Creates a client that will dispatch connection events to `handler`
    /// and frame messages with `config`.
    pub fn new(handler: Arc<H>, config: CodecConfig) -> Self {
        Self {
            handler,
            config,
            conn: None,
            _transport: PhantomData,
        }
    }

    /// Connects to `host:port`.
    ///
    /// Suspends until the transport handshake completes and the fresh
    /// connection has started dispatching callbacks to this client's
    /// handler (`on_connection_made` first).
    ///
    /// # Errors
    ///
    /// [`TransportError::Connect`](wirelink_transport::TransportError)
    /// on refusal, timeout, or DNS failure. No retry is attempted.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), WirelinkError> {
        let transport = T::connect(host, port).await?;
        let codec = codec_for(transport.framing(), self.config);
        let conn = Connection::spawn(transport, codec, Arc::clone(&self.handler));
        conn.established().await;
        tracing::debug!(id = %conn.id(), host, port, "client connected");
        self.conn = Some(conn);
        Ok(())
    }

    /// Disconnects, suspending until the transport is fully closed and
    /// `on_connection_lost` has fired. A client that is not connected is
    /// a no-op.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.disconnect();
            conn.closed().await;
        }
    }

    /// True iff the owned connection exists and is in `Connected` state.
    pub fn connected(&self) -> bool {
        self.conn.as_ref().is_some_and(Connection::is_connected)
    }

    /// The current connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    /// Sends one frame on the owned connection.
    ///
    /// # Errors
    ///
    /// [`WirelinkError::NotConnected`] when no live connection exists.
    pub fn send(&self, msg_type: u64, payload: &[u8]) -> Result<(), WirelinkError> {
        self.conn
            .as_ref()
            .ok_or(WirelinkError::NotConnected)?
            .send(msg_type, payload)
    }

    /// Packs a registered message kind and sends it.
    pub fn send_message<M: Message>(
        &self,
        registry: &Registry,
        message: &M,
    ) -> Result<(), WirelinkError> {
        self.conn
            .as_ref()
            .ok_or(WirelinkError::NotConnected)?
            .send_message(registry, message)
    }
}
