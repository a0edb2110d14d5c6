use crate::engine::{EngineState, GameEvent};
use crate::error::{EscrowError, Result};
use crate::external::Payout;
use crate::game::GameEntry;
use crate::ledger::Ledger;
use crate::storage::{from_sql_amount, to_sql_amount, Storage};
use crate::store::GameStore;
use crate::types::{GameKey, PlayerId};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

const META_PAUSED: &str = "paused";
const META_HEIGHT: &str = "height";

/// Engine state as stored, plus the height the CLI last advanced to.
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    pub engine: EngineState,
    pub height: u64,
}

pub struct StateStore<'a> {
    storage: &'a Storage,
}

impl<'a> StateStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn load_state(&self) -> Result<PersistedState> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT game_key, entry FROM games")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (key, entry) = row?;
            let key: GameKey = key.parse()?;
            let entry: GameEntry = serde_json::from_str(&entry)?;
            entries.push((key, entry));
        }

        let mut stmt = conn.prepare("SELECT player, amount FROM balances")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut balances = Vec::new();
        for row in rows {
            let (player, amount) = row?;
            let player: PlayerId = player.parse()?;
            balances.push((player, from_sql_amount(amount)?));
        }

        let paused = read_meta(&conn, META_PAUSED)?
            .map(|v| v == "true")
            .unwrap_or(false);
        let height = match read_meta(&conn, META_HEIGHT)? {
            Some(v) => v
                .parse()
                .map_err(|_| EscrowError::internal(format!("Corrupt stored height '{}'", v)))?,
            None => 0,
        };

        Ok(PersistedState {
            engine: EngineState {
                games: GameStore::from_entries(entries),
                ledger: Ledger::from_balances(balances),
                paused,
            },
            height,
        })
    }

    /// Replace the stored state and append the operation's journal in one
    /// transaction.
    pub async fn save_state(
        &self,
        state: &PersistedState,
        events: &[GameEvent],
        payouts: &[Payout],
    ) -> Result<()> {
        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        tx.execute("DELETE FROM games", [])?;
        for (key, entry) in state.engine.games.entries() {
            let status = match entry {
                GameEntry::Live(_) => "live",
                GameEntry::Closed { .. } => "closed",
            };
            tx.execute(
                "INSERT INTO games (game_key, status, entry, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![key.to_string(), status, serde_json::to_string(entry)?, now],
            )?;
        }

        tx.execute("DELETE FROM balances", [])?;
        for (player, amount) in state.engine.ledger.balances() {
            tx.execute(
                "INSERT INTO balances (player, amount) VALUES (?1, ?2)",
                params![player.to_string(), to_sql_amount(*amount)?],
            )?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO engine_meta (name, value) VALUES (?1, ?2)",
            params![META_PAUSED, state.engine.paused.to_string()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO engine_meta (name, value) VALUES (?1, ?2)",
            params![META_HEIGHT, state.height.to_string()],
        )?;

        for event in events {
            tx.execute(
                "INSERT INTO events (name, game_key, payload, height, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.name(),
                    event.game_key().map(|k| k.to_string()),
                    serde_json::to_string(event)?,
                    to_sql_amount(state.height)?,
                    now,
                ],
            )?;
        }

        for payout in payouts {
            tx.execute(
                "INSERT INTO payouts (player, amount, created_at) VALUES (?1, ?2, ?3)",
                params![payout.to.to_string(), to_sql_amount(payout.amount)?, now],
            )?;
        }

        tx.commit()?;

        tracing::debug!(
            "Saved engine state: {} events, {} payouts",
            events.len(),
            payouts.len()
        );
        Ok(())
    }
}

fn read_meta(conn: &rusqlite::Connection, name: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM engine_meta WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::move_commitment;
    use crate::config::EngineConfig;
    use crate::engine::{GameEngine, NewGame};
    use crate::external::{ManualHeight, PayoutLog};
    use crate::types::{Call, Digest32, Move};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn player(byte: u8) -> PlayerId {
        PlayerId::new([byte; 20])
    }

    #[tokio::test]
    async fn test_empty_database_loads_default_state() {
        let storage = Storage::in_memory().await.unwrap();
        let state = StateStore::new(&storage).load_state().await.unwrap();
        assert_eq!(state.engine, EngineState::default());
        assert_eq!(state.height, 0);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rps.db");
        let height = Arc::new(ManualHeight::new(40));
        let config = EngineConfig::new(player(0xc0));

        let mut engine = GameEngine::new(config.clone(), height.clone()).unwrap();
        let mut events = Vec::new();
        for (byte, stake) in [(1u8, 100u64), (2, 50)] {
            let commitment = move_commitment(&player(1), Move::Rock, b"pwd");
            events.push(
                engine
                    .new_game(
                        Call::new(player(1)).with_value(stake),
                        NewGame::new(Digest32::new([byte; 32]), commitment, 5, stake),
                    )
                    .unwrap(),
            );
        }
        height.set(46);
        events.push(
            engine
                .cancel(Call::new(player(1)), Digest32::new([2; 32]))
                .unwrap(),
        );
        let mut payouts = PayoutLog::new();
        events.push(engine.withdraw(Call::new(player(1)), &mut payouts).unwrap());

        {
            let storage = Storage::new(&db_path).await.unwrap();
            let state = PersistedState {
                engine: engine.snapshot(),
                height: 46,
            };
            StateStore::new(&storage)
                .save_state(&state, &events, payouts.payouts())
                .await
                .unwrap();
        }

        let storage = Storage::new(&db_path).await.unwrap();
        let loaded = StateStore::new(&storage).load_state().await.unwrap();
        assert_eq!(loaded.height, 46);
        assert_eq!(loaded.engine, engine.snapshot());

        let journal = crate::storage::EventStore::new(&storage)
            .list_events(None)
            .await
            .unwrap();
        assert_eq!(journal.len(), 4);
        assert_eq!(journal[3].event, events[3]);
    }
}
