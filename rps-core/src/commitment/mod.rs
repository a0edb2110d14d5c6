pub mod sealed;

pub use sealed::SealedMove;

use crate::types::{Digest32, Move, PlayerId};
use rand::RngCore;
use sha2::{Digest, Sha256};

const MOVE_TAG: &[u8] = b"rps/move/v1";
const GAME_TAG: &[u8] = b"rps/game/v1";

/// Digest binding `player` to `mv` under `secret`.
///
/// Every field before the secret has a fixed width, so the encoding is
/// unambiguous even though the secret length varies.
pub fn move_commitment(player: &PlayerId, mv: Move, secret: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(MOVE_TAG);
    hasher.update(player.as_bytes());
    hasher.update([mv.code()]);
    hasher.update(secret);
    Digest32::new(hasher.finalize().into())
}

/// Game key for a proposer/opponent pair. Order matters: `proposer` is
/// always player one.
pub fn game_identity(proposer: &PlayerId, opponent: &PlayerId) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(GAME_TAG);
    hasher.update(proposer.as_bytes());
    hasher.update(opponent.as_bytes());
    Digest32::new(hasher.finalize().into())
}

/// Rnd secret for commitment
pub fn generate_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(byte: u8) -> PlayerId {
        PlayerId::new([byte; 20])
    }

    #[test]
    fn test_commitment_is_deterministic() {
        let a = move_commitment(&player(1), Move::Paper, b"pwd1");
        let b = move_commitment(&player(1), Move::Paper, b"pwd1");
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_commitment_binds_every_input() {
        let base = move_commitment(&player(1), Move::Paper, b"pwd1");
        assert_ne!(base, move_commitment(&player(2), Move::Paper, b"pwd1"));
        assert_ne!(base, move_commitment(&player(1), Move::Rock, b"pwd1"));
        assert_ne!(base, move_commitment(&player(1), Move::Paper, b"pwd2"));
    }

    #[test]
    fn test_game_identity_is_order_sensitive() {
        let ab = game_identity(&player(1), &player(2));
        assert_eq!(ab, game_identity(&player(1), &player(2)));
        assert_ne!(ab, game_identity(&player(2), &player(1)));
        assert_ne!(ab, move_commitment(&player(1), Move::Rock, player(2).as_bytes()));
    }

    #[test]
    fn test_generated_secrets_differ() {
        let s1 = generate_secret();
        let s2 = generate_secret();
        assert_eq!(s1.len(), 32);
        assert_ne!(s1, s2);
    }
}
