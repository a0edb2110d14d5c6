use crate::error::{EscrowError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed-size byte identifiers that travel as lowercase hex.
macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;
            pub const ZERO: Self = Self([0u8; $len]);

            pub fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let bytes: [u8; $len] = bytes.try_into().map_err(|_| {
                    EscrowError::parse(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = EscrowError;

            fn from_str(s: &str) -> Result<Self> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)
                    .map_err(|e| EscrowError::parse(format!("invalid hex: {}", e)))?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Opaque caller identity. The all-zero value means "nobody".
    PlayerId,
    20
);

hex_id!(
    /// SHA-256 output used for move commitments and game keys.
    Digest32,
    32
);

pub type GameKey = Digest32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    Rock = 1,
    Paper = 2,
    Scissors = 3,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// The move this one defeats.
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Paper => Move::Rock,
            Move::Scissors => Move::Paper,
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = EscrowError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            other => Err(EscrowError::InvalidMove(other)),
        }
    }
}

impl FromStr for Move {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rock" | "r" | "1" => Ok(Move::Rock),
            "paper" | "p" | "2" => Ok(Move::Paper),
            "scissors" | "s" | "3" => Ok(Move::Scissors),
            _ => Err(EscrowError::parse(format!("unknown move '{}'", s))),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
        };
        f.write_str(name)
    }
}

/// Who invokes an operation and how much value comes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub caller: PlayerId,
    pub value: u64,
}

impl Call {
    pub fn new(caller: PlayerId) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_hex_round_trip() {
        let id = PlayerId::new([0xab; 20]);
        let parsed: PlayerId = format!("0x{}", id).parse().unwrap();
        assert_eq!(parsed, id);
        assert!(PlayerId::ZERO.is_zero());
        assert!(!id.is_zero());
    }

    #[test]
    fn test_digest_rejects_wrong_length() {
        assert!(matches!(
            "abcd".parse::<Digest32>(),
            Err(EscrowError::Parse(_))
        ));
    }

    #[test]
    fn test_move_codes() {
        assert!(matches!(Move::try_from(0), Err(EscrowError::InvalidMove(0))));
        assert!(matches!(Move::try_from(7), Err(EscrowError::InvalidMove(7))));
        for mv in Move::ALL {
            assert_eq!(Move::try_from(mv.code()).unwrap(), mv);
        }
        assert_eq!("Scissors".parse::<Move>().unwrap(), Move::Scissors);
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let id = PlayerId::new([1; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(20)));
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
