//! The routed client: a headless scene that receives roster and movement
//! updates through the routing layer, walks a small square, and leaves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use wirelink::prelude::*;

use crate::messages::{GameEvent, MoveCommand, registry};

#[derive(Default)]
struct HeadlessScene {
    my_id: Option<i16>,
    players: HashMap<i16, (i32, i32)>,
}

impl HeadlessScene {
    fn on_game_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::AssignId { player_id } => {
                tracing::info!(player_id, "assigned player id");
                self.my_id = Some(player_id);
            }
            GameEvent::PlayerJoined { player_id, x, y } => {
                tracing::info!(player_id, x, y, "player joined");
                self.players.insert(player_id, (x, y));
            }
            GameEvent::PlayerLeft { player_id } => {
                tracing::info!(player_id, "player left");
                self.players.remove(&player_id);
            }
        }
    }

    fn on_player_moved(&mut self, action: MoveCommand) {
        if let Some((x, y)) = self.players.get_mut(&action.player_id) {
            *x += i32::from(action.dx);
            *y += i32::from(action.dy);
            tracing::info!(player_id = action.player_id, x = *x, y = *y, "position update");
        }
    }
}

impl MessageRoutes for HeadlessScene {
    fn routes(table: &mut RouteTable<Self>) {
        table.route(Self::on_game_event);
        table.route(Self::on_player_moved);
    }
}

/// Connects, sends a lap of movement inputs, and disconnects.
pub async fn run(host: &str, port: u16) -> Result<(), WirelinkError> {
    let registry = Arc::new(registry());
    let handler = Arc::new(RoutingHandler::new(
        Arc::clone(&registry),
        HeadlessScene::default(),
    )?);
    let mut client = TcpClient::new(Arc::clone(&handler), CodecConfig::default());
    client.connect(host, port).await?;
    tracing::info!(host, port, "connected");

    let lap: [(i16, i16); 8] = [
        (1, 0),
        (1, 0),
        (0, 1),
        (0, 1),
        (-1, 0),
        (-1, 0),
        (0, -1),
        (0, -1),
    ];
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    for (dx, dy) in lap {
        ticker.tick().await;
        let player_id = handler.target().my_id.unwrap_or(-1);
        client.send_message(&registry, &MoveCommand { player_id, dx, dy })?;
    }

    // Let the last relays arrive before leaving.
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.disconnect().await;

    let scene = handler.target();
    tracing::info!(roster = scene.players.len(), "disconnected");
    Ok(())
}
