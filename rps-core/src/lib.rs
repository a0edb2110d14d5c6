//! rps-core - Commit-reveal Rock-Paper-Scissors escrow engine
//!
//! Two players stake equal amounts, commit to hidden moves, then reveal
//! them. Winnings are credited to an internal ledger and paid out by
//! explicit withdrawal, with timeouts refunding or awarding stakes when a
//! player stops responding.

pub mod commitment;
pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod game;
pub mod ledger;
pub mod storage;
pub mod store;
pub mod types;

pub use commitment::{game_identity, move_commitment, SealedMove};
pub use config::EngineConfig;
pub use engine::{EngineState, GameEngine, GameEvent, NewGame, SharedEngine};
pub use error::{EscrowError, Result};
pub use external::{HeightOracle, ManualHeight, Payout, PayoutLog, PayoutSink, WallClockHeight};
pub use game::{determine_winner, GameEntry, GameInfo, GamePhase, Outcome, Resolution};
pub use ledger::Ledger;
pub use storage::Storage;
pub use store::GameStore;
pub use types::{Call, Digest32, GameKey, Move, PlayerId};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_engine_round_trip_through_storage() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("rps.db")).await.unwrap();
        let alice = PlayerId::new([1; 20]);
        let bob = PlayerId::new([2; 20]);
        let height = Arc::new(ManualHeight::new(1));

        let mut engine = GameEngine::new(EngineConfig::new(PlayerId::new([9; 20])), height.clone())
            .unwrap();
        let key = game_identity(&alice, &bob);
        let rock = SealedMove::seal(alice, Move::Rock);
        let scissors = SealedMove::seal(bob, Move::Scissors);

        let events = vec![
            engine
                .new_game(
                    Call::new(alice).with_value(25),
                    NewGame::new(key, rock.commitment, 10, 25).against(bob),
                )
                .unwrap(),
            engine
                .join(Call::new(bob).with_value(25), key, scissors.commitment)
                .unwrap(),
            engine
                .reveal(Call::new(alice), key, Move::Rock.code(), &rock.secret)
                .unwrap(),
            engine
                .reveal(Call::new(bob), key, Move::Scissors.code(), &scissors.secret)
                .unwrap(),
        ];
        assert_eq!(engine.balance_of(&alice), 50);

        let store = storage::StateStore::new(&storage);
        store
            .save_state(
                &storage::PersistedState {
                    engine: engine.snapshot(),
                    height: height.current_height(),
                },
                &events,
                &[],
            )
            .await
            .unwrap();

        let persisted = store.load_state().await.unwrap();
        let restored = GameEngine::restore(
            engine.config().clone(),
            ManualHeight::new(persisted.height),
            persisted.engine,
        )
        .unwrap();
        assert_eq!(restored.balance_of(&alice), 50);
        assert!(matches!(restored.game(&key), Err(EscrowError::NotFound)));
        assert!(matches!(restored.entry(&key), Some(GameEntry::Closed { .. })));
    }
}
