use crate::error::{EscrowError, Result};
use crate::game::{Game, GameEntry, Resolution};
use crate::types::GameKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyed game records. A key is either live, closed, or never used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStore {
    entries: BTreeMap<GameKey, GameEntry>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new live game. Closed keys may be reused.
    pub fn create(&mut self, key: GameKey, game: Game) -> Result<()> {
        if self.is_live(&key) {
            return Err(EscrowError::GameAlreadyExists);
        }
        self.entries.insert(key, GameEntry::Live(game));
        Ok(())
    }

    pub fn get(&self, key: &GameKey) -> Result<&Game> {
        match self.entries.get(key) {
            Some(GameEntry::Live(game)) => Ok(game),
            _ => Err(EscrowError::NotFound),
        }
    }

    pub fn get_mut(&mut self, key: &GameKey) -> Result<&mut Game> {
        match self.entries.get_mut(key) {
            Some(GameEntry::Live(game)) => Ok(game),
            _ => Err(EscrowError::NotFound),
        }
    }

    pub fn entry(&self, key: &GameKey) -> Option<&GameEntry> {
        self.entries.get(key)
    }

    pub fn is_live(&self, key: &GameKey) -> bool {
        matches!(self.entries.get(key), Some(GameEntry::Live(_)))
    }

    /// Replace a live game with its tombstone and return the record.
    ///
    /// Tombstones are kept so a late `cancel` can tell `AlreadySettled`
    /// from `NotFound`. They are only replaced when the key is reused, so
    /// the store grows by one entry per distinct key ever played.
    pub fn clear(&mut self, key: &GameKey, resolution: Resolution, height: u64) -> Result<Game> {
        match self.entries.remove(key) {
            Some(GameEntry::Live(game)) => {
                self.entries
                    .insert(*key, GameEntry::Closed { resolution, height });
                Ok(game)
            }
            Some(closed) => {
                self.entries.insert(*key, closed);
                Err(EscrowError::NotFound)
            }
            None => Err(EscrowError::NotFound),
        }
    }

    pub fn live_games(&self) -> impl Iterator<Item = (&GameKey, &Game)> {
        self.entries.iter().filter_map(|(key, entry)| match entry {
            GameEntry::Live(game) => Some((key, game)),
            GameEntry::Closed { .. } => None,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&GameKey, &GameEntry)> {
        self.entries.iter()
    }

    /// Stakes currently held for live games.
    pub fn escrowed(&self) -> u64 {
        self.live_games()
            .fold(0u64, |acc, (_, game)| acc.saturating_add(game.escrowed()))
    }

    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (GameKey, GameEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}
