pub mod account_store;
pub mod event_store;
pub mod secret_store;
pub mod state_store;

pub use account_store::{Account, AccountStore};
pub use event_store::{EventStore, JournalEntry};
pub use secret_store::SecretStore;
pub use state_store::{PersistedState, StateStore};

use crate::error::{EscrowError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EscrowError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // One row per key ever used; closed games keep their tombstone
        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                game_key TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                entry TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS balances (
                player TEXT PRIMARY KEY,
                amount INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS engine_meta (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                game_key TEXT,
                payload TEXT NOT NULL,
                height INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS payouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player TEXT NOT NULL,
                amount INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                name TEXT PRIMARY KEY,
                player TEXT UNIQUE NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // One row per seat, an account may hold both seats of a game
        conn.execute(
            "CREATE TABLE IF NOT EXISTS secrets (
                game_key TEXT NOT NULL,
                account TEXT NOT NULL,
                commitment TEXT NOT NULL,
                sealed TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (game_key, account, commitment)
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

pub(crate) fn to_sql_amount(amount: u64) -> Result<i64> {
    i64::try_from(amount)
        .map_err(|_| EscrowError::internal(format!("Amount {} exceeds storage range", amount)))
}

pub(crate) fn from_sql_amount(amount: i64) -> Result<u64> {
    u64::try_from(amount)
        .map_err(|_| EscrowError::internal(format!("Negative amount {} in storage", amount)))
}
