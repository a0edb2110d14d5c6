use crate::commands::{choose_move, parse_hex, winner_label, Session};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::commitment::generate_secret;
use rps_core::storage::{EventStore, SecretStore};
use rps_core::{
    game_identity, move_commitment, Call, Digest32, EscrowError, GameEntry, GameEvent, GameInfo,
    GameKey, Move, NewGame, Resolution, Result, SealedMove,
};

#[derive(Subcommand)]
pub enum GameCommands {
    /// Open a new game and commit to a move
    New {
        /// Account creating the game
        account: String,
        /// Amount each player stakes
        #[arg(short, long)]
        stake: u64,
        /// Blocks until the game times out
        #[arg(long, default_value_t = 10)]
        delta: u64,
        /// Move to commit (rock, paper, scissors); prompts if omitted
        #[arg(short, long = "move")]
        mv: Option<String>,
        /// Reserve the second seat for this account or player id
        #[arg(short, long)]
        against: Option<String>,
        /// Game key (64 hex characters); derived or random if omitted
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Join an open game and commit to a move
    Join {
        /// Account joining
        account: String,
        /// Game key
        key: String,
        /// Move to commit; prompts if omitted
        #[arg(short, long = "move")]
        mv: Option<String>,
        /// Amount to send; defaults to the game's stake
        #[arg(short, long)]
        stake: Option<u64>,
    },
    /// Reveal a committed move
    Reveal {
        /// Account revealing
        account: String,
        /// Game key
        key: String,
        /// Move to reveal; read from the local secret store if omitted
        #[arg(short, long = "move")]
        mv: Option<String>,
        /// Secret used for the commitment (hex)
        #[arg(short, long)]
        secret: Option<String>,
    },
    /// Resolve a game whose timeout has passed
    Cancel {
        /// Account sending the cancel
        account: String,
        /// Game key
        key: String,
    },
    /// Show a game and its history
    Show {
        /// Game key
        key: String,
    },
    /// List live games
    List,
}

pub async fn handle_game_command(cmd: GameCommands, session: &Session) -> Result<()> {
    match cmd {
        GameCommands::New {
            account,
            stake,
            delta,
            mv,
            against,
            key,
        } => {
            let account = session.account(&account).await?;
            let opponent = match against.as_deref() {
                Some(other) => Some(session.resolve_player(other).await?),
                None => None,
            };
            let key: GameKey = match (key, opponent) {
                (Some(key), _) => key.parse()?,
                (None, Some(opponent)) => game_identity(&account.player, &opponent),
                (None, None) => Digest32::from_slice(&generate_secret())?,
            };
            let mv = choose_move(mv.as_deref())?;
            let sealed = SealedMove::seal(account.player, mv);

            let (mut engine, _height) = session.load_engine().await?;
            let mut params = NewGame::new(key, sealed.commitment, delta, stake);
            if let Some(opponent) = opponent {
                params = params.against(opponent);
            }
            let event = engine.new_game(Call::new(account.player).with_value(stake), params)?;

            SecretStore::new(&session.storage)
                .save_secret(&key, &account.name, &sealed)
                .await?;
            session.persist(&engine, &[event.clone()], &[]).await?;

            println!("Game created!");
            println!("  Key: {}", key);
            println!("  Stake: {}", stake);
            if let GameEvent::GameCreated { expiry_height, .. } = event {
                println!("  Expires after height: {}", expiry_height);
            }
            println!("  Your move ({}) is sealed until reveal.", mv);
        }

        GameCommands::Join {
            account,
            key,
            mv,
            stake,
        } => {
            let account = session.account(&account).await?;
            let key: GameKey = key.parse()?;

            let (mut engine, _height) = session.load_engine().await?;
            let value = match stake {
                Some(stake) => stake,
                None => engine.game(&key)?.stake,
            };
            let mv = choose_move(mv.as_deref())?;
            let sealed = SealedMove::seal(account.player, mv);

            let event = engine.join(
                Call::new(account.player).with_value(value),
                key,
                sealed.commitment,
            )?;

            SecretStore::new(&session.storage)
                .save_secret(&key, &account.name, &sealed)
                .await?;
            session.persist(&engine, &[event.clone()], &[]).await?;

            println!("Joined game {} with stake {}", key, value);
            if let GameEvent::Joined { expiry_height, .. } = event {
                println!("  Reveal by height {}", expiry_height);
            }
        }

        GameCommands::Reveal {
            account,
            key,
            mv,
            secret,
        } => {
            let account = session.account(&account).await?;
            let key: GameKey = key.parse()?;
            let secrets = SecretStore::new(&session.storage);
            let (mut engine, _height) = session.load_engine().await?;

            let (move_code, secret, stored) = match (mv, secret) {
                (Some(mv), Some(secret)) => (mv.parse::<Move>()?.code(), parse_hex(&secret)?, None),
                (None, None) => {
                    let info = engine.game(&key)?;
                    let stored = secrets.load_secrets(&key, &account.name).await?;
                    let sealed = next_sealed_move(&info, &stored).ok_or_else(|| {
                        EscrowError::config(format!(
                            "No stored move for '{}' in game {}; pass --move and --secret",
                            account.name, key
                        ))
                    })?;
                    (sealed.mv.code(), sealed.secret.clone(), Some(sealed.commitment))
                }
                _ => {
                    return Err(EscrowError::config(
                        "--move and --secret must be given together",
                    ))
                }
            };

            let event = engine.reveal(Call::new(account.player), key, move_code, &secret)?;
            session.persist(&engine, &[event.clone()], &[]).await?;

            let settled = matches!(engine.entry(&key), Some(GameEntry::Closed { .. }));
            if settled {
                secrets.delete_game_secrets(&key).await?;
            } else if let Some(commitment) = stored {
                secrets.delete_secret(&key, &account.name, &commitment).await?;
            }

            if let GameEvent::Revealed { mv, winner_id, .. } = event {
                println!("Revealed {} in game {}", mv, key);
                if settled {
                    println!("Game settled, winner: {}", winner_label(winner_id));
                } else {
                    println!("Waiting for the other player to reveal.");
                }
            }
        }

        GameCommands::Cancel { account, key } => {
            let account = session.account(&account).await?;
            let key: GameKey = key.parse()?;

            let (mut engine, _height) = session.load_engine().await?;
            let event = engine.cancel(Call::new(account.player), key)?;
            session.persist(&engine, &[event.clone()], &[]).await?;
            SecretStore::new(&session.storage)
                .delete_game_secrets(&key)
                .await?;

            if let GameEvent::Cancelled { winner_id, .. } = event {
                println!("Game {} cancelled, winner: {}", key, winner_label(winner_id));
            }
        }

        GameCommands::Show { key } => {
            let key: GameKey = key.parse()?;
            let (engine, _height) = session.load_engine().await?;

            match engine.entry(&key) {
                None => return Err(EscrowError::NotFound),
                Some(GameEntry::Closed { resolution, height }) => {
                    let (how, winner_id) = match resolution {
                        Resolution::Settled { winner_id } => ("settled", *winner_id),
                        Resolution::Cancelled { winner_id } => ("cancelled", *winner_id),
                    };
                    println!("Game {}", key);
                    println!("  Status: {} at height {}", how, height);
                    println!("  Winner: {}", winner_label(winner_id));
                }
                Some(GameEntry::Live(_)) => {
                    let info = engine.game(&key)?;
                    print_game(session, &info, engine.current_height()).await?;
                }
            }

            let history = EventStore::new(&session.storage).events_for_game(&key).await?;
            if !history.is_empty() {
                println!();
                println!("History:");
                for entry in history {
                    println!("  [{}] {}", entry.height, entry.event.name());
                }
            }
        }

        GameCommands::List => {
            let (engine, _height) = session.load_engine().await?;
            let games = engine.live_games();

            if games.is_empty() {
                println!("No live games.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Key", "Phase", "Stake", "Expiry", "Player 1", "Player 2"]);

            for info in games {
                let player2 = match info.player2 {
                    Some(player) => session.display_name(&player).await?,
                    None => "-".to_string(),
                };
                table.add_row(vec![
                    info.key.to_string()[..16].to_string(),
                    format!("{:?}", info.phase),
                    info.stake.to_string(),
                    info.expiry_height.to_string(),
                    session.display_name(&info.player1).await?,
                    player2,
                ]);
            }

            println!("{}", table);
            println!("Current height: {}", engine.current_height());
        }
    }

    Ok(())
}

async fn print_game(session: &Session, info: &GameInfo, height: u64) -> Result<()> {
    println!("Game {}", info.key);
    println!("  Phase: {:?}", info.phase);
    println!("  Stake: {}", info.stake);
    println!("  Expires after height: {} (now {})", info.expiry_height, height);
    println!(
        "  Player 1: {} ({})",
        session.display_name(&info.player1).await?,
        reveal_status(info.move1)
    );
    match info.player2 {
        Some(player) => println!(
            "  Player 2: {} ({})",
            session.display_name(&player).await?,
            reveal_status(info.move2)
        ),
        None => match info.opponent {
            Some(opponent) => println!(
                "  Player 2: waiting for {}",
                session.display_name(&opponent).await?
            ),
            None => println!("  Player 2: open seat"),
        },
    }
    Ok(())
}

/// First stored move that opens a still-unrevealed seat of the game. The
/// seat's owner is implied: a commitment binds the player that made it.
fn next_sealed_move<'a>(info: &GameInfo, stored: &'a [SealedMove]) -> Option<&'a SealedMove> {
    let open: Vec<Digest32> = [
        (info.move1.is_none()).then_some(info.move1_commitment),
        info.move2_commitment.filter(|_| info.move2.is_none()),
    ]
    .into_iter()
    .flatten()
    .collect();

    stored.iter().find(|sealed| open.contains(&sealed.commitment))
}

fn reveal_status(mv: Option<Move>) -> String {
    match mv {
        Some(mv) => format!("revealed {}", mv),
        None => "committed".to_string(),
    }
}

/// Compute a commitment without touching any game.
pub async fn handle_commit(
    session: &Session,
    player: &str,
    mv: Option<&str>,
    secret: Option<&str>,
) -> Result<()> {
    let player = session.resolve_player(player).await?;
    let mv = choose_move(mv)?;
    let secret = match secret {
        Some(secret) => parse_hex(secret)?,
        None => generate_secret(),
    };

    println!("Commitment: {}", move_commitment(&player, mv, &secret));
    println!("Secret (save this for reveal): {}", hex::encode(&secret));
    Ok(())
}
