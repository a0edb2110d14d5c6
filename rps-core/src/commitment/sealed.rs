use crate::commitment::{generate_secret, move_commitment};
use crate::types::{Digest32, Move, PlayerId};
use serde::{Deserialize, Serialize};

/// A move kept private until reveal, together with its commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedMove {
    pub player: PlayerId,
    pub mv: Move,
    #[serde(with = "hex_bytes")]
    pub secret: Vec<u8>,
    pub commitment: Digest32,
}

impl SealedMove {
    /// Seal `mv` for `player` under a fresh random secret.
    pub fn seal(player: PlayerId, mv: Move) -> Self {
        Self::with_secret(player, mv, generate_secret())
    }

    pub fn with_secret(player: PlayerId, mv: Move, secret: Vec<u8>) -> Self {
        let commitment = move_commitment(&player, mv, &secret);
        Self {
            player,
            mv,
            secret,
            commitment,
        }
    }

    pub fn verify(&self, commitment: &Digest32) -> bool {
        move_commitment(&self.player, self.mv, &self.secret) == *commitment
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
