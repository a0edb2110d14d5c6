use crate::engine::GameEvent;
use crate::error::Result;
use crate::external::Payout;
use crate::storage::{from_sql_amount, Storage};
use crate::types::GameKey;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// An event as recorded in the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub height: u64,
    pub event: GameEvent,
    pub created_at: DateTime<Utc>,
}

pub struct EventStore<'a> {
    storage: &'a Storage,
}

impl<'a> EventStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Most recent `limit` events in the order they happened; all of them
    /// when `limit` is `None`.
    pub async fn list_events(&self, limit: Option<usize>) -> Result<Vec<JournalEntry>> {
        let conn = self.storage.get_connection().await;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = conn.prepare(
            "SELECT id, height, payload, created_at FROM (
                 SELECT id, height, payload, created_at FROM events
                 ORDER BY id DESC LIMIT ?1
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![limit], journal_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(journal_entry(row?)?);
        }
        Ok(entries)
    }

    pub async fn events_for_game(&self, key: &GameKey) -> Result<Vec<JournalEntry>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, height, payload, created_at FROM events
             WHERE game_key = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![key.to_string()], journal_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(journal_entry(row?)?);
        }
        Ok(entries)
    }

    pub async fn list_payouts(&self) -> Result<Vec<Payout>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT player, amount FROM payouts ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut payouts = Vec::new();
        for row in rows {
            let (player, amount) = row?;
            payouts.push(Payout {
                to: player.parse()?,
                amount: from_sql_amount(amount)?,
            });
        }
        Ok(payouts)
    }
}

type JournalRow = (i64, i64, String, i64);

fn journal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn journal_entry((id, height, payload, created_at): JournalRow) -> Result<JournalEntry> {
    Ok(JournalEntry {
        id,
        height: from_sql_amount(height)?,
        event: serde_json::from_str(&payload)?,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineState;
    use crate::storage::{PersistedState, StateStore};
    use crate::types::{Digest32, PlayerId};

    fn created(byte: u8) -> GameEvent {
        GameEvent::GameCreated {
            player1: PlayerId::new([1; 20]),
            key: Digest32::new([byte; 32]),
            commitment: Digest32::new([9; 32]),
            stake: 10,
            expiry_height: 20,
        }
    }

    async fn record(storage: &Storage, events: &[GameEvent], payouts: &[Payout]) {
        let state = PersistedState {
            engine: EngineState::default(),
            height: 12,
        };
        StateStore::new(storage)
            .save_state(&state, events, payouts)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_events_limit_keeps_latest() {
        let storage = Storage::in_memory().await.unwrap();
        record(&storage, &[created(1), created(2), created(3)], &[]).await;

        let all = EventStore::new(&storage).list_events(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].event, created(1));
        assert_eq!(all[0].height, 12);

        let latest = EventStore::new(&storage).list_events(Some(2)).await.unwrap();
        let keys: Vec<_> = latest.iter().filter_map(|e| e.event.game_key()).collect();
        assert_eq!(keys, vec![Digest32::new([2; 32]), Digest32::new([3; 32])]);
    }

    #[tokio::test]
    async fn test_events_for_game_and_payouts() {
        let storage = Storage::in_memory().await.unwrap();
        let player = PlayerId::new([1; 20]);
        let withdrawn = GameEvent::Withdrawn { player, amount: 20 };
        let payout = Payout {
            to: player,
            amount: 20,
        };
        record(&storage, &[created(1), created(2), withdrawn], &[payout.clone()]).await;

        let store = EventStore::new(&storage);
        let game_events = store.events_for_game(&Digest32::new([2; 32])).await.unwrap();
        assert_eq!(game_events.len(), 1);
        assert_eq!(game_events[0].event, created(2));

        assert_eq!(store.list_payouts().await.unwrap(), vec![payout]);
    }
}
