use crate::error::{EscrowError, Result};
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only identity allowed to pause and unpause the engine.
    pub controller: PlayerId,
    pub max_stake: u64,
    /// Largest timeout window a game may ask for.
    pub max_delta: u64,
    /// Re-arm the timeout window by the creation delta when player two joins.
    pub extend_expiry_on_join: bool,
    pub allow_self_play: bool,
}

// Stakes stay far below u64::MAX so summed payouts cannot overflow in practice.
const STAKE_CEILING: u64 = u64::MAX >> 8;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            controller: PlayerId::ZERO,
            max_stake: 1_000_000_000_000,
            max_delta: 100_000,
            extend_expiry_on_join: false,
            allow_self_play: true,
        }
    }
}

impl EngineConfig {
    pub fn new(controller: PlayerId) -> Self {
        Self {
            controller,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.controller.is_zero() {
            return Err(EscrowError::config("Controller identity cannot be zero"));
        }

        if self.max_stake == 0 {
            return Err(EscrowError::config("Max stake must be greater than 0"));
        }

        if self.max_stake > STAKE_CEILING {
            return Err(EscrowError::config(format!(
                "Max stake must not exceed {}",
                STAKE_CEILING
            )));
        }

        if self.max_delta == 0 {
            return Err(EscrowError::config("Max delta must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_controller() {
        assert!(matches!(
            EngineConfig::default().validate(),
            Err(EscrowError::Config(_))
        ));
        EngineConfig::new(PlayerId::new([1; 20])).validate().unwrap();
    }

    #[test]
    fn test_rejects_unbounded_stake() {
        let mut config = EngineConfig::new(PlayerId::new([1; 20]));
        config.max_stake = u64::MAX;
        assert!(config.validate().is_err());
        config.max_stake = 0;
        assert!(config.validate().is_err());
    }
}
