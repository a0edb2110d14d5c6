use crate::commands::Session;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::storage::AccountStore;
use rps_core::{PlayerId, Result};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account with a random player id
    Create {
        /// Account name
        name: String,
    },
    /// Register an existing player id under a name
    Import {
        /// Account name
        name: String,
        /// Player id (40 hex characters)
        player: String,
    },
    /// List all accounts
    List,
}

pub async fn handle_account_command(cmd: AccountCommands, session: &Session) -> Result<()> {
    let store = AccountStore::new(&session.storage);

    match cmd {
        AccountCommands::Create { name } => {
            let account = store.create_account(&name).await?;
            println!("Account created!");
            println!("  Name: {}", account.name);
            println!("  Player id: {}", account.player);
        }

        AccountCommands::Import { name, player } => {
            let player: PlayerId = player.parse()?;
            let account = store.import_account(&name, player).await?;
            println!("Account '{}' imported as {}", account.name, account.player);
        }

        AccountCommands::List => {
            let accounts = store.list_accounts().await?;

            if accounts.is_empty() {
                println!("No accounts found.");
                println!("Create one with: rps account create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Player id", "Role", "Created"]);

            for account in accounts {
                let role = if account.player == session.config.engine.controller {
                    "controller"
                } else {
                    "player"
                };
                table.add_row(vec![
                    account.name.clone(),
                    account.player.to_string(),
                    role.to_string(),
                    account.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}
