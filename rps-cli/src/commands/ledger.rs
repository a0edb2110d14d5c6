use crate::commands::Session;
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::{Call, GameEvent, PayoutLog, Result};

pub async fn handle_balance(session: &Session, account: Option<String>) -> Result<()> {
    let (engine, _height) = session.load_engine().await?;

    if let Some(name) = account {
        let account = session.account(&name).await?;
        println!(
            "Balance for '{}': {}",
            account.name,
            engine.balance_of(&account.player)
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Player", "Withdrawable"]);
    for (player, amount) in engine.ledger().balances() {
        table.add_row(vec![session.display_name(player).await?, amount.to_string()]);
    }

    println!("{}", table);
    println!("Escrowed in live games: {}", engine.escrowed());
    println!("Held in total: {}", engine.held_value());
    Ok(())
}

pub async fn handle_withdraw(session: &Session, account: &str) -> Result<()> {
    let account = session.account(account).await?;
    let (mut engine, _height) = session.load_engine().await?;

    let mut payouts = PayoutLog::new();
    let event = engine.withdraw(Call::new(account.player), &mut payouts)?;
    session.persist(&engine, &[event.clone()], payouts.payouts()).await?;

    if let GameEvent::Withdrawn { amount, .. } = event {
        println!("Withdrew {} to '{}'", amount, account.name);
    }
    Ok(())
}
