//! # Wirelink
//!
//! Typed binary message layer over stream and datagram transports.
//!
//! Wirelink exchanges `(type, payload)` frames over TCP or UDP and routes
//! decoded messages to handlers by kind, so application code never touches
//! raw frames. The layers, leaves first:
//!
//! ```text
//! wirelink-protocol   codec + message registry   (pure, no I/O)
//! wirelink-transport  TCP / UDP byte movement
//! wirelink            Connection → Client / Server → Routing
//! ```
//!
//! A [`Connection`] binds one transport to one [`ConnectionHandler`] —
//! three callbacks: `on_connection_made`, `on_recv_message`,
//! `on_connection_lost`. A [`Client`] owns one outbound connection; a
//! [`Server`] fans many inbound connections into one shared handler. The
//! routing layer ([`Router`], [`RoutingHandler`]) maps decoded message
//! kinds to methods on a target object declared via [`MessageRoutes`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wirelink::prelude::*;
//!
//! # #[derive(Default)] struct Scene;
//! # impl MessageRoutes for Scene { fn routes(_: &mut wirelink::RouteTable<Self>) {} }
//! # async fn run(registry: Arc<Registry>) -> Result<(), WirelinkError> {
//! let handler = Arc::new(RoutingHandler::new(registry, Scene::default())?);
//! let mut client = TcpClient::new(handler, CodecConfig::default());
//! client.connect("127.0.0.1", 8888).await?;
//! client.send(1, b"ping")?;
//! client.disconnect().await;
//! # Ok(()) }
//! ```

mod client;
mod connection;
mod error;
mod handler;
mod routing;
mod server;

pub use client::{Client, TcpClient, UdpClient};
pub use connection::{Connection, ConnectionState};
pub use error::WirelinkError;
pub use handler::{ConnectionHandler, ServerHandler};
pub use routing::{MessageRoutes, RouteTable, Router, RoutingError, RoutingHandler};
pub use server::{Server, TcpServer, UdpServer};

/// One-stop imports for applications built on Wirelink.
pub mod prelude {
    pub use crate::{
        Client, Connection, ConnectionHandler, ConnectionState, MessageRoutes, RouteTable,
        Router, RoutingError, RoutingHandler, Server, ServerHandler, TcpClient, TcpServer,
        UdpClient, UdpServer, WirelinkError,
    };
    pub use wirelink_protocol::{
        ByteOrder, CodecConfig, DatagramCodec, DecodedMessage, Frame, FrameCodec, Message,
        ProtocolError, Registry, StreamCodec,
    };
    pub use wirelink_transport::{ConnectionId, Framing, TransportError};
}
