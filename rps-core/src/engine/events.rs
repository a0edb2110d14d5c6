use crate::types::{Digest32, GameKey, Move, PlayerId};
use serde::{Deserialize, Serialize};

/// Notification returned by every successful mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameCreated {
        player1: PlayerId,
        key: GameKey,
        commitment: Digest32,
        stake: u64,
        expiry_height: u64,
    },
    Joined {
        player2: PlayerId,
        key: GameKey,
        commitment: Digest32,
        expiry_height: u64,
    },
    /// `winner_id` stays 0 until the second reveal settles the game.
    Revealed {
        player: PlayerId,
        key: GameKey,
        mv: Move,
        winner_id: u8,
    },
    Cancelled {
        key: GameKey,
        player1: PlayerId,
        player2: Option<PlayerId>,
        winner_id: u8,
    },
    Withdrawn {
        player: PlayerId,
        amount: u64,
    },
    Paused {
        account: PlayerId,
    },
    Unpaused {
        account: PlayerId,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameCreated { .. } => "game_created",
            GameEvent::Joined { .. } => "joined",
            GameEvent::Revealed { .. } => "revealed",
            GameEvent::Cancelled { .. } => "cancelled",
            GameEvent::Withdrawn { .. } => "withdrawn",
            GameEvent::Paused { .. } => "paused",
            GameEvent::Unpaused { .. } => "unpaused",
        }
    }

    pub fn game_key(&self) -> Option<GameKey> {
        match self {
            GameEvent::GameCreated { key, .. }
            | GameEvent::Joined { key, .. }
            | GameEvent::Revealed { key, .. }
            | GameEvent::Cancelled { key, .. } => Some(*key),
            _ => None,
        }
    }
}
