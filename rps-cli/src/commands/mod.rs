pub mod account;
pub mod admin;
pub mod game;
pub mod ledger;

pub use account::{handle_account_command, AccountCommands};
pub use admin::{handle_events, handle_init, handle_mine, handle_pause, handle_status, InitArgs};
pub use game::{handle_commit, handle_game_command, GameCommands};
pub use ledger::{handle_balance, handle_withdraw};

use crate::config::CliConfig;
use dialoguer::Select;
use rps_core::storage::{Account, AccountStore, PersistedState, StateStore};
use rps_core::{
    EscrowError, GameEngine, GameEvent, ManualHeight, Move, Payout, PlayerId, Result, Storage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DB_FILE: &str = "rps.db";

pub type CliEngine = GameEngine<Arc<ManualHeight>>;

/// Everything a command needs: the database, the CLI config and where
/// both live.
pub struct Session {
    pub data_dir: PathBuf,
    pub storage: Storage,
    pub config: CliConfig,
}

impl Session {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let storage = Storage::new(&data_dir.join(DB_FILE)).await?;
        let config = CliConfig::load(data_dir).await?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            storage,
            config,
        })
    }

    /// Rebuild the engine from the database at the stored height.
    pub async fn load_engine(&self) -> Result<(CliEngine, Arc<ManualHeight>)> {
        let persisted = StateStore::new(&self.storage).load_state().await?;
        let height = Arc::new(ManualHeight::new(persisted.height));
        let engine = GameEngine::restore(
            self.config.engine_config()?,
            height.clone(),
            persisted.engine,
        )?;
        Ok((engine, height))
    }

    /// Persist the engine after a successful operation along with what it
    /// emitted.
    pub async fn persist(
        &self,
        engine: &CliEngine,
        events: &[GameEvent],
        payouts: &[Payout],
    ) -> Result<()> {
        let state = PersistedState {
            engine: engine.snapshot(),
            height: engine.current_height(),
        };
        StateStore::new(&self.storage)
            .save_state(&state, events, payouts)
            .await
    }

    pub async fn account(&self, name: &str) -> Result<Account> {
        AccountStore::new(&self.storage).get_account(name).await
    }

    /// Accept either an account name or a hex player id.
    pub async fn resolve_player(&self, name_or_id: &str) -> Result<PlayerId> {
        match self.account(name_or_id).await {
            Ok(account) => Ok(account.player),
            Err(EscrowError::AccountNotFound { name }) => name_or_id
                .parse()
                .map_err(|_| EscrowError::AccountNotFound { name }),
            Err(e) => Err(e),
        }
    }

    /// Account name for `player` when it is local, else its hex id.
    pub async fn display_name(&self, player: &PlayerId) -> Result<String> {
        let account = AccountStore::new(&self.storage).find_by_player(player).await?;
        Ok(account
            .map(|a| a.name)
            .unwrap_or_else(|| player.to_string()))
    }
}

/// Parse `mv`, or ask for one interactively when it was not given.
pub fn choose_move(mv: Option<&str>) -> Result<Move> {
    if let Some(mv) = mv {
        return mv.parse();
    }

    let index = Select::new()
        .with_prompt("Choose your move")
        .items(&Move::ALL[..])
        .default(0)
        .interact()
        .map_err(|e| EscrowError::internal(format!("Prompt failed: {}", e)))?;
    Ok(Move::ALL[index])
}

pub fn parse_hex(value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| EscrowError::parse(format!("invalid hex '{}': {}", value, e)))
}

pub fn winner_label(winner_id: u8) -> &'static str {
    match winner_id {
        1 => "player 1",
        2 => "player 2",
        _ => "none",
    }
}
