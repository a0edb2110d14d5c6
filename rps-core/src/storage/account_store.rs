use crate::error::{EscrowError, Result};
use crate::storage::Storage;
use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A named local identity the CLI can act as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub player: PlayerId,
    pub created_at: DateTime<Utc>,
}

pub struct AccountStore<'a> {
    storage: &'a Storage,
}

impl<'a> AccountStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an account under a freshly generated player id.
    pub async fn create_account(&self, name: &str) -> Result<Account> {
        let mut bytes = [0u8; PlayerId::LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        self.import_account(name, PlayerId::new(bytes)).await
    }

    pub async fn import_account(&self, name: &str, player: PlayerId) -> Result<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EscrowError::config("Account name cannot be empty"));
        }
        if player.is_zero() {
            return Err(EscrowError::config("Player id cannot be zero"));
        }

        let conn = self.storage.get_connection().await;
        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM accounts WHERE name = ?1 OR player = ?2",
                params![name, player.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = existing {
            return Err(EscrowError::AccountExists { name: existing });
        }

        let account = Account {
            name: name.to_string(),
            player,
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO accounts (name, player, created_at) VALUES (?1, ?2, ?3)",
            params![
                account.name,
                account.player.to_string(),
                account.created_at.timestamp()
            ],
        )?;

        tracing::debug!("Created account {} ({})", account.name, account.player);
        Ok(account)
    }

    pub async fn get_account(&self, name: &str) -> Result<Account> {
        let conn = self.storage.get_connection().await;
        let row = conn
            .query_row(
                "SELECT name, player, created_at FROM accounts WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some(row) => account_from_row(row),
            None => Err(EscrowError::AccountNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub async fn find_by_player(&self, player: &PlayerId) -> Result<Option<Account>> {
        let conn = self.storage.get_connection().await;
        let row = conn
            .query_row(
                "SELECT name, player, created_at FROM accounts WHERE player = ?1",
                params![player.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(account_from_row).transpose()
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.storage.get_connection().await;

        let mut stmt =
            conn.prepare("SELECT name, player, created_at FROM accounts ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(account_from_row(row?)?);
        }

        Ok(accounts)
    }
}

fn account_from_row((name, player, created_at): (String, String, i64)) -> Result<Account> {
    Ok(Account {
        name,
        player: player.parse()?,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_account() {
        let storage = Storage::in_memory().await.unwrap();
        let store = AccountStore::new(&storage);

        let alice = store.create_account("alice").await.unwrap();
        assert!(!alice.player.is_zero());

        let loaded = store.get_account("alice").await.unwrap();
        assert_eq!(loaded.player, alice.player);

        let found = store.find_by_player(&alice.player).await.unwrap();
        assert_eq!(found.map(|a| a.name), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let storage = Storage::in_memory().await.unwrap();
        let store = AccountStore::new(&storage);

        store.create_account("bob").await.unwrap();
        let result = store.create_account("bob").await;
        assert!(matches!(result, Err(EscrowError::AccountExists { .. })));
    }

    #[tokio::test]
    async fn test_import_rejects_known_player() {
        let storage = Storage::in_memory().await.unwrap();
        let store = AccountStore::new(&storage);
        let player = PlayerId::new([7; 20]);

        store.import_account("first", player).await.unwrap();
        let result = store.import_account("second", player).await;
        assert!(
            matches!(result, Err(EscrowError::AccountExists { name }) if name == "first")
        );
    }

    #[tokio::test]
    async fn test_missing_account() {
        let storage = Storage::in_memory().await.unwrap();
        let store = AccountStore::new(&storage);

        let result = store.get_account("nobody").await;
        assert!(matches!(result, Err(EscrowError::AccountNotFound { .. })));
        assert!(store.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_accounts_sorted() {
        let storage = Storage::in_memory().await.unwrap();
        let store = AccountStore::new(&storage);

        store.create_account("carol").await.unwrap();
        store.create_account("alice").await.unwrap();

        let names: Vec<String> = store
            .list_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }
}
