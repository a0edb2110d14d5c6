use crate::commitment::SealedMove;
use crate::error::Result;
use crate::storage::Storage;
use crate::types::{Digest32, GameKey};
use chrono::Utc;
use rusqlite::params;

/// Sealed moves awaiting reveal, keyed by game, account name and
/// commitment.
pub struct SecretStore<'a> {
    storage: &'a Storage,
}

impl<'a> SecretStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_secret(&self, key: &GameKey, account: &str, sealed: &SealedMove) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO secrets (game_key, account, commitment, sealed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.to_string(),
                account,
                sealed.commitment.to_string(),
                serde_json::to_string(sealed)?,
                Utc::now().timestamp()
            ],
        )?;

        Ok(())
    }

    /// Every sealed move `account` holds in the game, oldest first.
    pub async fn load_secrets(&self, key: &GameKey, account: &str) -> Result<Vec<SealedMove>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT sealed FROM secrets WHERE game_key = ?1 AND account = ?2
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![key.to_string(), account], |row| {
            row.get::<_, String>(0)
        })?;

        let mut secrets = Vec::new();
        for row in rows {
            secrets.push(serde_json::from_str(&row?)?);
        }
        Ok(secrets)
    }

    pub async fn delete_secret(&self, key: &GameKey, account: &str, commitment: &Digest32) -> Result<()> {
        let conn = self.storage.get_connection().await;
        conn.execute(
            "DELETE FROM secrets WHERE game_key = ?1 AND account = ?2 AND commitment = ?3",
            params![key.to_string(), account, commitment.to_string()],
        )?;
        Ok(())
    }

    /// Drop whatever is left for a game that has been closed.
    pub async fn delete_game_secrets(&self, key: &GameKey) -> Result<()> {
        let conn = self.storage.get_connection().await;
        conn.execute(
            "DELETE FROM secrets WHERE game_key = ?1",
            params![key.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Move, PlayerId};

    #[tokio::test]
    async fn test_secret_lifecycle() {
        let storage = Storage::in_memory().await.unwrap();
        let store = SecretStore::new(&storage);
        let key = Digest32::new([4; 32]);
        let sealed = SealedMove::seal(PlayerId::new([1; 20]), Move::Paper);

        assert!(store.load_secrets(&key, "alice").await.unwrap().is_empty());

        store.save_secret(&key, "alice", &sealed).await.unwrap();
        let loaded = store.load_secrets(&key, "alice").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].mv, Move::Paper);
        assert_eq!(loaded[0].secret, sealed.secret);
        assert!(loaded[0].verify(&sealed.commitment));

        // Scoped per account
        assert!(store.load_secrets(&key, "bob").await.unwrap().is_empty());

        store
            .delete_secret(&key, "alice", &sealed.commitment)
            .await
            .unwrap();
        assert!(store.load_secrets(&key, "alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_both_seats_of_one_account_are_kept() {
        let storage = Storage::in_memory().await.unwrap();
        let store = SecretStore::new(&storage);
        let key = Digest32::new([5; 32]);
        let player = PlayerId::new([1; 20]);
        let seat1 = SealedMove::seal(player, Move::Rock);
        let seat2 = SealedMove::seal(player, Move::Scissors);

        store.save_secret(&key, "alice", &seat1).await.unwrap();
        store.save_secret(&key, "alice", &seat2).await.unwrap();

        let loaded = store.load_secrets(&key, "alice").await.unwrap();
        let moves: Vec<Move> = loaded.iter().map(|s| s.mv).collect();
        assert_eq!(moves, vec![Move::Rock, Move::Scissors]);

        store
            .delete_secret(&key, "alice", &seat2.commitment)
            .await
            .unwrap();
        let left = store.load_secrets(&key, "alice").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].commitment, seat1.commitment);

        store.delete_game_secrets(&key).await.unwrap();
        assert!(store.load_secrets(&key, "alice").await.unwrap().is_empty());
    }
}
