//! The demo protocol: two message kinds over the default codec config.
//!
//! `MoveCommand` shows a hand-packed fixed-width binary payload;
//! `GameEvent` shows a JSON payload. The wire doesn't care — the frame
//! header is the codec's, the payload encoding is the kind's.

use serde::{Deserialize, Serialize};
use wirelink::prelude::*;

pub const DEFAULT_PORT: u16 = 8888;

/// A player's movement input: three signed 16-bit big-endian fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommand {
    pub player_id: i16,
    pub dx: i16,
    pub dy: i16,
}

impl Message for MoveCommand {
    fn pack(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(6);
        out.extend_from_slice(&self.player_id.to_be_bytes());
        out.extend_from_slice(&self.dx.to_be_bytes());
        out.extend_from_slice(&self.dy.to_be_bytes());
        Ok(out)
    }

    fn unpack(data: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; 6] = data.try_into().map_err(|_| ProtocolError::Decode {
            kind: "MoveCommand",
            reason: format!("expected 6 bytes, got {}", data.len()),
        })?;
        Ok(Self {
            player_id: i16::from_be_bytes([bytes[0], bytes[1]]),
            dx: i16::from_be_bytes([bytes[2], bytes[3]]),
            dy: i16::from_be_bytes([bytes[4], bytes[5]]),
        })
    }
}

/// Server-to-client roster updates, JSON-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    AssignId { player_id: i16 },
    PlayerJoined { player_id: i16, x: i32, y: i32 },
    PlayerLeft { player_id: i16 },
}

impl Message for GameEvent {
    fn pack(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Encode {
            kind: "GameEvent",
            reason: e.to_string(),
        })
    }

    fn unpack(data: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode {
            kind: "GameEvent",
            reason: e.to_string(),
        })
    }
}

/// Builds the shared registry. Both ends must declare the same codes.
pub fn registry() -> Registry {
    let mut builder = Registry::builder(CodecConfig::default().type_size_bytes());
    builder.register::<MoveCommand>(0).expect("register MoveCommand");
    builder.register::<GameEvent>(1).expect("register GameEvent");
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_command_round_trip() {
        let action = MoveCommand {
            player_id: -2,
            dx: 1,
            dy: -300,
        };
        assert_eq!(MoveCommand::unpack(&action.pack().unwrap()).unwrap(), action);
    }

    #[test]
    fn test_game_event_round_trip() {
        let event = GameEvent::PlayerJoined {
            player_id: 3,
            x: -10,
            y: 25,
        };
        assert_eq!(GameEvent::unpack(&event.pack().unwrap()).unwrap(), event);
    }

    #[test]
    fn test_registry_declares_both_kinds() {
        let registry = registry();
        assert_eq!(registry.code_of::<MoveCommand>(), Some(0));
        assert_eq!(registry.code_of::<GameEvent>(), Some(1));
    }
}
