//! The broadcast server: tracks a position per connected player and
//! relays every movement to the whole roster.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use wirelink::prelude::*;

use crate::messages::{GameEvent, MoveCommand, registry};

struct Player {
    conn: Connection,
    player_id: i16,
    x: i32,
    y: i32,
}

/// Per-connection session state lives here, keyed by connection id — the
/// server handler is shared by every accepted connection.
pub struct MoveServer {
    registry: Arc<Registry>,
    players: Mutex<HashMap<ConnectionId, Player>>,
    next_player_id: Mutex<i16>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MoveServer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            players: Mutex::new(HashMap::new()),
            next_player_id: Mutex::new(0),
        }
    }

    fn broadcast(&self, players: &HashMap<ConnectionId, Player>, event: &GameEvent) {
        for player in players.values() {
            if let Err(e) = player.conn.send_message(&self.registry, event) {
                tracing::debug!(id = %player.conn.id(), error = %e, "broadcast failed");
            }
        }
    }
}

impl ConnectionHandler for MoveServer {
    fn on_connection_made(&self, conn: &Connection) {
        let player_id = {
            let mut next = lock(&self.next_player_id);
            let id = *next;
            *next += 1;
            id
        };
        tracing::info!(player_id, peer = ?conn.peer_addr(), "player joined");

        let mut players = lock(&self.players);

        // Tell the newcomer who they are and who was already here.
        if let Err(e) = conn.send_message(&self.registry, &GameEvent::AssignId { player_id }) {
            tracing::debug!(error = %e, "assign failed");
        }
        for player in players.values() {
            let _ = conn.send_message(
                &self.registry,
                &GameEvent::PlayerJoined {
                    player_id: player.player_id,
                    x: player.x,
                    y: player.y,
                },
            );
        }

        players.insert(
            conn.id(),
            Player {
                conn: conn.clone(),
                player_id,
                x: 0,
                y: 0,
            },
        );
        self.broadcast(&players, &GameEvent::PlayerJoined { player_id, x: 0, y: 0 });
    }

    fn on_recv_message(
        &self,
        conn: &Connection,
        frame: Frame,
        _peer: Option<SocketAddr>,
    ) -> Result<(), WirelinkError> {
        let decoded = self
            .registry
            .decode(frame.msg_type, &frame.payload)
            .map_err(WirelinkError::Protocol)?;
        if let Ok(action) = decoded.downcast::<MoveCommand>() {
            let mut players = lock(&self.players);
            if let Some(player) = players.get_mut(&conn.id()) {
                player.x += i32::from(action.dx);
                player.y += i32::from(action.dy);
                tracing::debug!(
                    player_id = player.player_id,
                    x = player.x,
                    y = player.y,
                    "player moved"
                );
            }
            // Relay the movement to the whole roster, sender included.
            for player in players.values() {
                let _ = player.conn.send_message(&self.registry, &action);
            }
        }
        Ok(())
    }

    fn on_connection_lost(&self, conn: &Connection) {
        let mut players = lock(&self.players);
        if let Some(player) = players.remove(&conn.id()) {
            tracing::info!(player_id = player.player_id, "player left");
            self.broadcast(
                &players,
                &GameEvent::PlayerLeft {
                    player_id: player.player_id,
                },
            );
        }
    }
}

impl ServerHandler for MoveServer {
    fn on_start(&self) {
        tracing::info!("move server ready");
    }

    fn on_stop(&self) {
        tracing::info!("move server stopping");
    }
}

/// Runs the server until Ctrl-C.
pub async fn run(host: &str, port: u16) -> Result<(), WirelinkError> {
    let registry = Arc::new(registry());
    let handler = Arc::new(MoveServer::new(registry));
    let mut server = TcpServer::new(handler, CodecConfig::default());
    server.start(host, port).await?;

    let _ = tokio::signal::ctrl_c().await;
    server.stop().await;
    Ok(())
}
