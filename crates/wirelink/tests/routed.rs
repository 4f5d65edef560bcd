//! End-to-end routing: a server pushes typed messages, a routed client
//! dispatches them into a scene object without ever touching frames.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use wirelink::prelude::*;

// =========================================================================
// Demo protocol
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    x: i32,
    y: i32,
}

impl Message for Position {
    fn pack(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(8);
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        Ok(out)
    }

    fn unpack(data: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; 8] = data.try_into().map_err(|_| ProtocolError::Decode {
            kind: "Position",
            reason: format!("expected 8 bytes, got {}", data.len()),
        })?;
        Ok(Self {
            x: i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            y: i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Note(String);

impl Message for Note {
    fn pack(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(self.0.clone().into_bytes())
    }

    fn unpack(data: &[u8]) -> Result<Self, ProtocolError> {
        String::from_utf8(data.to_vec())
            .map(Note)
            .map_err(|e| ProtocolError::Decode {
                kind: "Note",
                reason: e.to_string(),
            })
    }
}

fn registry() -> Registry {
    let mut builder = Registry::builder(CodecConfig::default().type_size_bytes());
    builder.register::<Position>(0).expect("register Position");
    builder.register::<Note>(1).expect("register Note");
    builder.build()
}

// =========================================================================
// Routed target
// =========================================================================

/// Binds a handler for `Position` only; `Note` is registered protocol
/// but deliberately unhandled by this scene.
#[derive(Default)]
struct Scene {
    positions: Vec<Position>,
}

impl Scene {
    fn on_position(&mut self, p: Position) {
        self.positions.push(p);
    }
}

impl MessageRoutes for Scene {
    fn routes(table: &mut RouteTable<Self>) {
        table.route(Self::on_position);
    }
}

// =========================================================================
// Pushing server
// =========================================================================

/// Greets every new connection with one `Position` and one `Note`.
struct Pusher {
    registry: Arc<Registry>,
}

impl ConnectionHandler for Pusher {
    fn on_connection_made(&self, conn: &Connection) {
        conn.send_message(&self.registry, &Position { x: 3, y: 4 })
            .expect("push Position");
        conn.send_message(&self.registry, &Note("welcome".into()))
            .expect("push Note");
    }

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

impl ServerHandler for Pusher {}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met within 2s");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_routed_client_dispatches_typed_messages() {
    let registry = Arc::new(registry());

    let pusher = Arc::new(Pusher {
        registry: Arc::clone(&registry),
    });
    let mut server = TcpServer::new(pusher, CodecConfig::default());
    server.start("127.0.0.1", 0).await.expect("server should start");
    let addr = server.local_addr().expect("server addr");

    let routing = Arc::new(
        RoutingHandler::new(Arc::clone(&registry), Scene::default()).expect("build routes"),
    );
    let mut client = TcpClient::new(Arc::clone(&routing), CodecConfig::default());
    client
        .connect("127.0.0.1", addr.port())
        .await
        .expect("client should connect");

    // The Position lands in the scene via its bound handler; the Note —
    // registered but unbound — is ignored without an error, and the
    // connection keeps working.
    wait_until(|| !routing.target().positions.is_empty()).await;
    assert_eq!(routing.target().positions, vec![Position { x: 3, y: 4 }]);

    client.disconnect().await;
    server.stop().await;
}
