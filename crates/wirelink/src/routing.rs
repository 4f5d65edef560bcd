//! Typed dispatch: route decoded messages to methods on a target object.
//!
//! A target type (a game scene, a session, any stateful object) declares
//! its handlers once by implementing [`MessageRoutes`] — an explicit
//! listing of `(message kind, handler)` bindings, no reflection involved.
//! [`Router::build`] turns that declaration into a route table, failing
//! fast on duplicates, and [`Router::dispatch`] then maps each incoming
//! `(type, payload)` to exactly the bound handler via the message
//! registry.
//!
//! The router holds no state between dispatches; everything the handlers
//! mutate lives in the target.

use std::any::TypeId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};

use wirelink_protocol::{DecodedMessage, Frame, Message, ProtocolError, Registry};

use crate::connection::Connection;
use crate::error::WirelinkError;
use crate::handler::ConnectionHandler;

/// Errors from building or driving a route table.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// Two handlers were bound to the same message kind on one target.
    ///
    /// Raised while building the table, never at dispatch time.
    #[error("duplicate route for message kind {0}")]
    DuplicateRoute(&'static str),

    /// Resolving or decoding the incoming frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

type HandlerFn<S> = Box<dyn Fn(&mut S, DecodedMessage) + Send + Sync>;

/// Declares which handler runs for which message kind on a target `S`.
///
/// ```ignore
/// impl MessageRoutes for Scene {
///     fn routes(table: &mut RouteTable<Self>) {
///         table.route(Self::on_player_moved);
///         table.route(Self::on_game_event);
///     }
/// }
/// ```
pub trait MessageRoutes: Send + Sized + 'static {
    /// Lists every `(message kind, handler)` binding for this target.
    fn routes(table: &mut RouteTable<Self>);
}

/// Collects the bindings declared by [`MessageRoutes::routes`].
pub struct RouteTable<S> {
    entries: Vec<(TypeId, &'static str, HandlerFn<S>)>,
}

impl<S: 'static> RouteTable<S> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds message kind `M` to `handler`.
    ///
    /// The kind is inferred from the handler's argument, so bindings read
    /// as a plain list of methods. Binding the same kind twice is caught
    /// when the table is built.
    pub fn route<M, F>(&mut self, handler: F)
    where
        M: Message,
        F: Fn(&mut S, M) + Send + Sync + 'static,
    {
        let erased = move |state: &mut S, decoded: DecodedMessage| {
            // The TypeId lookup already matched, so the downcast holds.
            if let Ok(message) = decoded.downcast::<M>() {
                handler(state, message);
            }
        };
        self.entries.push((
            TypeId::of::<M>(),
            std::any::type_name::<M>(),
            Box::new(erased),
        ));
    }
}

/// The built route table for a target type `S`.
pub struct Router<S> {
    routes: HashMap<TypeId, HandlerFn<S>>,
}

impl<S> std::fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl<S: MessageRoutes> Router<S> {
    /// Runs `S`'s route declaration and builds the table.
    ///
    /// # Errors
    ///
    /// [`RoutingError::DuplicateRoute`] when two handlers were bound to
    /// one message kind — a configuration error, caught here before any
    /// I/O happens.
    pub fn build() -> Result<Self, RoutingError> {
        let mut table = RouteTable::new();
        S::routes(&mut table);

        let mut routes = HashMap::with_capacity(table.entries.len());
        for (type_id, kind, handler) in table.entries {
            if routes.insert(type_id, handler).is_some() {
                return Err(RoutingError::DuplicateRoute(kind));
            }
        }
        Ok(Self { routes })
    }

    /// Decodes `(msg_type, payload)` through `registry` and invokes the
    /// bound handler on `state`.
    ///
    /// A kind that is registered but has no binding on this target is
    /// silently ignored — targets are free to handle a subset of the
    /// protocol. An *unregistered* type code is an error, because it
    /// means the peer speaks a different protocol.
    pub fn dispatch(
        &self,
        registry: &Registry,
        state: &mut S,
        msg_type: u64,
        payload: &[u8],
    ) -> Result<(), RoutingError> {
        let decoded = registry.decode(msg_type, payload)?;
        if let Some(handler) = self.routes.get(&decoded.type_id()) {
            handler(state, decoded);
        }
        Ok(())
    }

    /// Number of bound routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are bound.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RoutingHandler — routing as a connection handler
// ---------------------------------------------------------------------------

/// A [`ConnectionHandler`] that dispatches every received frame into a
/// routed target.
///
/// This is the glue that lets a stateful object receive typed messages
/// without touching frames: hand a `RoutingHandler` to a
/// [`Client`](crate::Client) (or [`Server`](crate::Server)) and each
/// incoming frame is decoded through the registry and routed to the
/// target's bound method. Connection open/close events are ignored here;
/// wrap or extend the target if it needs them.
pub struct RoutingHandler<S: MessageRoutes> {
    registry: std::sync::Arc<Registry>,
    router: Router<S>,
    target: Mutex<S>,
}

impl<S: MessageRoutes> RoutingHandler<S> {
    /// Builds the route table for `target` and wraps both.
    ///
    /// # Errors
    ///
    /// [`RoutingError::DuplicateRoute`] from the build step.
    pub fn new(registry: std::sync::Arc<Registry>, target: S) -> Result<Self, RoutingError> {
        Ok(Self {
            registry,
            router: Router::build()?,
            target: Mutex::new(target),
        })
    }

    /// Locks and returns the routed target, for application-side access
    /// to the state the handlers mutate.
    pub fn target(&self) -> MutexGuard<'_, S> {
        match self.target.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The registry this handler decodes with.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl<S: MessageRoutes> ConnectionHandler for RoutingHandler<S> {
    fn on_connection_made(&self, _conn: &Connection) {}

    fn on_recv_message(
        &self,
        _conn: &Connection,
        frame: Frame,
        _peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        let mut target = self.target();
        self.router
            .dispatch(&self.registry, &mut target, frame.msg_type, &frame.payload)?;
        Ok(())
    }

    fn on_connection_lost(&self, _conn: &Connection) {}
}

// =========================================================================
// Tests
// =========================================================================
