use crate::types::{Digest32, GameKey, Move, PlayerId};
use serde::{Deserialize, Serialize};

/// Result of comparing two revealed moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Draw,
    Player1,
    Player2,
}

impl Outcome {
    /// Wire form of the outcome: 0 draw, 1 player one, 2 player two.
    pub fn winner_id(self) -> u8 {
        match self {
            Outcome::Draw => 0,
            Outcome::Player1 => 1,
            Outcome::Player2 => 2,
        }
    }
}

/// Fixed payoff table for player one's move against player two's.
pub fn determine_winner(move1: Move, move2: Move) -> Outcome {
    if move1 == move2 {
        Outcome::Draw
    } else if move1.beats() == move2 {
        Outcome::Player1
    } else {
        Outcome::Player2
    }
}

/// One side of a game: who sits there, what they committed to, and the
/// move once revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub player: PlayerId,
    pub commitment: Digest32,
    pub revealed: Option<Move>,
}

impl Seat {
    pub fn new(player: PlayerId, commitment: Digest32) -> Self {
        Self {
            player,
            commitment,
            revealed: None,
        }
    }

    pub fn has_revealed(&self) -> bool {
        self.revealed.is_some()
    }
}

/// A live game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub stake: u64,
    pub expiry_height: u64,
    pub delta_height: u64,
    pub seat1: Seat,
    pub seat2: Option<Seat>,
    /// When set, only this identity may take the second seat.
    pub opponent: Option<PlayerId>,
}

impl Game {
    pub fn player1(&self) -> PlayerId {
        self.seat1.player
    }

    pub fn player2(&self) -> Option<PlayerId> {
        self.seat2.as_ref().map(|s| s.player)
    }

    pub fn is_joined(&self) -> bool {
        self.seat2.is_some()
    }

    /// Value held in escrow for this game.
    pub fn escrowed(&self) -> u64 {
        if self.is_joined() {
            self.stake * 2
        } else {
            self.stake
        }
    }

    pub fn phase(&self) -> GamePhase {
        match &self.seat2 {
            None => GamePhase::Created,
            Some(seat2) => match (self.seat1.has_revealed(), seat2.has_revealed()) {
                (false, false) => GamePhase::Joined,
                (true, false) => GamePhase::Player1Revealed,
                (false, true) => GamePhase::Player2Revealed,
                // Settlement clears the record in the same operation.
                (true, true) => GamePhase::Settled,
            },
        }
    }

    pub fn is_expired_at(&self, height: u64) -> bool {
        height > self.expiry_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Created,
    Joined,
    Player1Revealed,
    Player2Revealed,
    Settled,
}

/// How a cleared game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Settled { winner_id: u8 },
    Cancelled { winner_id: u8 },
}

/// What sits at a key in the store: a live game, or the tombstone left
/// when one was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEntry {
    Live(Game),
    Closed { resolution: Resolution, height: u64 },
}

/// Game info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub key: GameKey,
    pub phase: GamePhase,
    pub stake: u64,
    pub expiry_height: u64,
    pub player1: PlayerId,
    pub move1_commitment: Digest32,
    pub move1: Option<Move>,
    pub player2: Option<PlayerId>,
    pub move2_commitment: Option<Digest32>,
    pub move2: Option<Move>,
    pub opponent: Option<PlayerId>,
}

impl GameInfo {
    pub fn from_game(key: GameKey, game: &Game) -> Self {
        Self {
            key,
            phase: game.phase(),
            stake: game.stake,
            expiry_height: game.expiry_height,
            player1: game.seat1.player,
            move1_commitment: game.seat1.commitment,
            move1: game.seat1.revealed,
            player2: game.player2(),
            move2_commitment: game.seat2.as_ref().map(|s| s.commitment),
            move2: game.seat2.as_ref().and_then(|s| s.revealed),
            opponent: game.opponent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payoff_table() {
        use Move::*;
        let table = [
            (Rock, Rock, 0),
            (Rock, Paper, 2),
            (Rock, Scissors, 1),
            (Paper, Rock, 1),
            (Paper, Paper, 0),
            (Paper, Scissors, 2),
            (Scissors, Rock, 2),
            (Scissors, Paper, 1),
            (Scissors, Scissors, 0),
        ];
        for (move1, move2, winner) in table {
            assert_eq!(
                determine_winner(move1, move2).winner_id(),
                winner,
                "{} vs {}",
                move1,
                move2
            );
        }
    }

    #[test]
    fn test_phase_follows_seats() {
        let mut game = Game {
            stake: 10,
            expiry_height: 5,
            delta_height: 5,
            seat1: Seat::new(PlayerId::new([1; 20]), Digest32::new([1; 32])),
            seat2: None,
            opponent: None,
        };
        assert_eq!(game.phase(), GamePhase::Created);
        assert_eq!(game.escrowed(), 10);

        game.seat2 = Some(Seat::new(PlayerId::new([2; 20]), Digest32::new([2; 32])));
        assert_eq!(game.phase(), GamePhase::Joined);
        assert_eq!(game.escrowed(), 20);

        if let Some(seat2) = game.seat2.as_mut() {
            seat2.revealed = Some(Move::Rock);
        }
        assert_eq!(game.phase(), GamePhase::Player2Revealed);

        game.seat1.revealed = Some(Move::Paper);
        assert_eq!(game.phase(), GamePhase::Settled);
    }

    #[test]
    fn test_expiry_boundary() {
        let game = Game {
            stake: 1,
            expiry_height: 10,
            delta_height: 10,
            seat1: Seat::new(PlayerId::new([1; 20]), Digest32::new([1; 32])),
            seat2: None,
            opponent: None,
        };
        assert!(!game.is_expired_at(10));
        assert!(game.is_expired_at(11));
    }
}
