//! The handler contract: the three callbacks a connection drives.
//!
//! Any component can implement this — a client delegating to routing, a
//! server tracking sessions, a test recorder. The connection holds a
//! shared reference to one handler and invokes it from the connection's
//! own receive task, so for a given connection the callbacks never
//! overlap and always arrive in wire order.

use std::net::SocketAddr;

use wirelink_protocol::Frame;

use crate::connection::Connection;
use crate::error::WirelinkError;

/// Callbacks invoked by a [`Connection`] as its transport produces events.
///
/// Implementations use interior mutability for any state they keep: the
/// callbacks take `&self` because one handler instance is shared by every
/// connection wired to it (a server receives these once per accepted
/// connection and distinguishes peers by [`Connection::id`]).
pub trait ConnectionHandler: Send + Sync + 'static {
    /// The connection's transport is up; `send` works from here on.
    fn on_connection_made(&self, conn: &Connection);

    /// A complete frame arrived.
    ///
    /// `peer` carries the sender's address on datagram server endpoints,
    /// where one connection receives from many peers; it is `None` on
    /// stream connections.
    ///
    /// # Errors
    ///
    /// Errors are reported by the connection task through `tracing` and
    /// do not close the connection. Returning one (rather than logging
    /// inside the handler) keeps dispatch failures visible to the layer
    /// that owns the callback loop.
    fn on_recv_message(
        &self,
        conn: &Connection,
        frame: Frame,
        peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError>;

    /// The connection reached its terminal state. Fires exactly once per
    /// connection, whoever initiated the close; clean up per-connection
    /// state here.
    fn on_connection_lost(&self, conn: &Connection);
}

/// Extra lifecycle hooks for handlers driving a [`Server`](crate::Server).
///
/// Both hooks default to doing nothing.
pub trait ServerHandler: ConnectionHandler {
    /// The listening socket is bound; called once per successful start.
    fn on_start(&self) {}

    /// The server is stopping; called before the listening socket closes.
    fn on_stop(&self) {}
}
