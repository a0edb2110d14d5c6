use crate::commands::Session;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use rps_core::storage::EventStore;
use rps_core::{Call, EngineConfig, EscrowError, GameKey, Result};

#[derive(Args)]
pub struct InitArgs {
    /// Account allowed to pause and unpause the engine
    pub controller: String,
    /// Largest stake a game may ask for
    #[arg(long)]
    pub max_stake: Option<u64>,
    /// Largest timeout window in blocks
    #[arg(long)]
    pub max_delta: Option<u64>,
    /// Restart the timeout window when player two joins
    #[arg(long)]
    pub extend_expiry_on_join: bool,
    /// Reject a player joining their own game
    #[arg(long)]
    pub no_self_play: bool,
    /// Skip confirmation when replacing an existing configuration
    #[arg(short, long)]
    pub force: bool,
}

pub async fn handle_init(session: &mut Session, args: InitArgs) -> Result<()> {
    let controller = session.account(&args.controller).await?;

    if session.config.is_initialized() && !args.force {
        let confirmed = Confirm::new()
            .with_prompt("Engine is already initialized. Replace its configuration?")
            .default(false)
            .interact()
            .map_err(|e| EscrowError::internal(format!("Prompt failed: {}", e)))?;
        if !confirmed {
            println!("Initialization cancelled.");
            return Ok(());
        }
    }

    let defaults = EngineConfig::default();
    let engine = EngineConfig {
        controller: controller.player,
        max_stake: args.max_stake.unwrap_or(defaults.max_stake),
        max_delta: args.max_delta.unwrap_or(defaults.max_delta),
        extend_expiry_on_join: args.extend_expiry_on_join,
        allow_self_play: !args.no_self_play,
    };
    engine.validate()?;

    session.config.controller_account = Some(controller.name.clone());
    session.config.engine = engine;
    session.config.save(&session.data_dir).await?;

    tracing::info!("Engine initialized with controller {}", controller.player);
    println!("Engine initialized!");
    println!("  Controller: {} ({})", controller.name, controller.player);
    println!("  Max stake: {}", session.config.engine.max_stake);
    println!("  Max delta: {}", session.config.engine.max_delta);
    Ok(())
}

pub async fn handle_pause(session: &Session, account: &str, pause: bool) -> Result<()> {
    let account = session.account(account).await?;
    let (mut engine, _height) = session.load_engine().await?;

    let event = if pause {
        engine.pause(Call::new(account.player))?
    } else {
        engine.unpause(Call::new(account.player))?
    };
    session.persist(&engine, &[event], &[]).await?;

    if pause {
        println!("Engine paused. Games are frozen until unpaused.");
    } else {
        println!("Engine unpaused.");
    }
    Ok(())
}

/// Advance the local height by `blocks`.
pub async fn handle_mine(session: &Session, blocks: u64) -> Result<()> {
    let (engine, height) = session.load_engine().await?;
    let current = engine.current_height();
    if current.checked_add(blocks).is_none() {
        return Err(EscrowError::parse(format!("cannot mine {} blocks past height {}", blocks, current)));
    }

    let new_height = height.advance(blocks);
    session.persist(&engine, &[], &[]).await?;

    tracing::debug!("Height advanced from {} to {}", current, new_height);
    println!("Height is now {}", new_height);
    Ok(())
}

pub async fn handle_status(session: &Session) -> Result<()> {
    let (engine, _height) = session.load_engine().await?;
    let config = engine.config();

    println!("Engine status:");
    println!("  Height: {}", engine.current_height());
    println!("  Paused: {}", engine.is_paused());
    println!(
        "  Controller: {}",
        session
            .config
            .controller_account
            .clone()
            .unwrap_or_else(|| config.controller.to_string())
    );
    println!("  Max stake: {}", config.max_stake);
    println!("  Max delta: {}", config.max_delta);
    println!("  Extend expiry on join: {}", config.extend_expiry_on_join);
    println!("  Self-play allowed: {}", config.allow_self_play);
    println!();
    println!("  Live games: {}", engine.live_games().len());
    println!("  Escrowed: {}", engine.escrowed());
    println!("  Owed to players: {}", engine.ledger().total());
    Ok(())
}

pub async fn handle_events(session: &Session, limit: Option<usize>, game: Option<String>) -> Result<()> {
    let store = EventStore::new(&session.storage);
    let entries = match game {
        Some(key) => {
            let key: GameKey = key.parse()?;
            store.events_for_game(&key).await?
        }
        None => store.list_events(limit).await?,
    };

    if entries.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Height", "Event", "Details", "Time"]);

    for entry in entries {
        table.add_row(vec![
            entry.id.to_string(),
            entry.height.to_string(),
            entry.event.name().to_string(),
            serde_json::to_string(&entry.event)?,
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}
