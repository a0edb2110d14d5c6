use crate::error::{EscrowError, Result};
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-player credit balances, decoupling payout computation from the
/// outbound transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<PlayerId, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, player: &PlayerId) -> u64 {
        self.balances.get(player).copied().unwrap_or(0)
    }

    /// Sum of every balance still owed to players, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.balances
            .values()
            .fold(0u64, |acc, amount| acc.saturating_add(*amount))
    }

    pub fn balances(&self) -> impl Iterator<Item = (&PlayerId, &u64)> {
        self.balances.iter()
    }

    pub fn credit(&mut self, player: PlayerId, amount: u64) -> Result<()> {
        self.credit_all(&[(player, amount)])
    }

    /// Apply several credits, or none of them if any would overflow.
    pub fn credit_all(&mut self, credits: &[(PlayerId, u64)]) -> Result<()> {
        let mut staged: BTreeMap<PlayerId, u64> = BTreeMap::new();
        for (player, amount) in credits {
            let current = staged
                .get(player)
                .copied()
                .unwrap_or_else(|| self.balance_of(player));
            let next = current
                .checked_add(*amount)
                .ok_or(EscrowError::BalanceOverflow)?;
            staged.insert(*player, next);
        }

        for (player, balance) in staged {
            if balance > 0 {
                self.balances.insert(player, balance);
            }
        }
        Ok(())
    }

    /// Zero the balance of `player` and hand back what it held.
    pub fn withdraw(&mut self, player: &PlayerId) -> Result<u64> {
        match self.balances.remove(player) {
            Some(amount) if amount > 0 => Ok(amount),
            _ => Err(EscrowError::NoFunds),
        }
    }

    pub(crate) fn from_balances(balances: impl IntoIterator<Item = (PlayerId, u64)>) -> Self {
        Self {
            balances: balances.into_iter().filter(|(_, amount)| *amount > 0).collect(),
        }
    }

    /// Put back an amount taken by [`Ledger::withdraw`] whose transfer failed.
    pub(crate) fn restore(&mut self, player: PlayerId, amount: u64) -> Result<()> {
        self.credit(player, amount)
    }
}
