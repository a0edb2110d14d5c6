mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::Session;
use rps_core::EscrowError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Commit-reveal Rock-Paper-Scissors with escrowed stakes")]
#[command(version)]
struct Cli {
    /// Data directory for the game database
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the engine and its controller
    Init(commands::InitArgs),

    /// Account management commands
    #[command(subcommand)]
    Account(commands::AccountCommands),

    /// Game commands
    #[command(subcommand)]
    Game(commands::GameCommands),

    /// Compute a move commitment without playing it
    Commit {
        /// Account name or player id
        player: String,
        /// Move (rock, paper, scissors); prompts if omitted
        #[arg(short, long = "move")]
        mv: Option<String>,
        /// Secret (hex); random if omitted
        #[arg(short, long)]
        secret: Option<String>,
    },

    /// Show withdrawable balances
    Balance {
        /// Only show this account
        account: Option<String>,
    },

    /// Withdraw an account's whole balance
    Withdraw {
        /// Account name
        account: String,
    },

    /// Advance the block height
    Mine {
        /// Number of blocks
        #[arg(default_value_t = 1)]
        blocks: u64,
    },

    /// Freeze all game and withdrawal operations (controller only)
    Pause {
        /// Controller account
        account: String,
    },

    /// Lift a pause (controller only)
    Unpause {
        /// Controller account
        account: String,
    },

    /// Show engine height, limits and totals
    Status,

    /// Show the event journal
    Events {
        /// Show at most this many recent events
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only show events of this game
        #[arg(short, long)]
        game: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "rps={},rps_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rps")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let mut session = Session::open(&data_dir)
        .await
        .with_context(|| format!("Failed to open game data in {}", data_dir.display()))?;

    // Execute command
    let result = match cli.command {
        Commands::Init(args) => commands::handle_init(&mut session, args).await,
        Commands::Account(cmd) => commands::handle_account_command(cmd, &session).await,
        Commands::Game(cmd) => commands::handle_game_command(cmd, &session).await,
        Commands::Commit { player, mv, secret } => {
            commands::handle_commit(&session, &player, mv.as_deref(), secret.as_deref()).await
        }
        Commands::Balance { account } => commands::handle_balance(&session, account).await,
        Commands::Withdraw { account } => commands::handle_withdraw(&session, &account).await,
        Commands::Mine { blocks } => commands::handle_mine(&session, blocks).await,
        Commands::Pause { account } => commands::handle_pause(&session, &account, true).await,
        Commands::Unpause { account } => commands::handle_pause(&session, &account, false).await,
        Commands::Status => commands::handle_status(&session).await,
        Commands::Events { limit, game } => commands::handle_events(&session, limit, game).await,
    };

    if let Err(e) = result {
        match e {
            EscrowError::AccountNotFound { name } => {
                eprintln!("Error: Account '{}' not found", name);
                eprintln!("Use 'rps account list' to see available accounts");
            }
            EscrowError::WrongStake { expected, got } => {
                eprintln!("Error: Wrong stake");
                eprintln!("Game requires: {}, Sent: {}", expected, got);
            }
            EscrowError::Expired { expiry, height } => {
                eprintln!("Error: Game expired at height {} (now {})", expiry, height);
                eprintln!("Use 'rps game cancel' to resolve it");
            }
            EscrowError::NotYetExpired { expiry, height } => {
                eprintln!("Error: Game is still running until height {} (now {})", expiry, height);
                eprintln!("Use 'rps mine' to advance the height");
            }
            EscrowError::Paused => {
                eprintln!("Error: Engine is paused");
                eprintln!("The controller can resume it with 'rps unpause <account>'");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
