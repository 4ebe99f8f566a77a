//! Commands against the deployed Solcasts program

use anyhow::{Context, Result};
use colored::Colorize;
use market_model::{cpmm, Side};
use solana_sdk::{pubkey::Pubkey, signature::Signer};
use std::str::FromStr;

use crate::program::{self, MarketState};
use crate::{client, config::NetworkConfig, display};

fn parse_pubkey(value: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {} address: {}", what, value))
}

/// Creator given on the command line, else the configured keypair
fn resolve_creator(config: &NetworkConfig, creator: Option<String>) -> Result<Pubkey> {
    match creator {
        Some(value) => parse_pubkey(&value, "creator"),
        None => config
            .pubkey()
            .context("No creator given and no keypair configured"),
    }
}

/// Market PDA, its bump and both outcome mints under the configured program
fn market_addresses(config: &NetworkConfig, creator: &Pubkey) -> (Pubkey, u8, Pubkey, Pubkey) {
    let (market, bump) = program::derive_market_pda(&config.program_id, creator);
    let (yes_mint, _) = program::derive_mint_pda(&config.program_id, &market, Side::Yes);
    let (no_mint, _) = program::derive_mint_pda(&config.program_id, &market, Side::No);
    (market, bump, yes_mint, no_mint)
}

pub async fn show_pdas(config: &NetworkConfig, creator: Option<String>) -> Result<()> {
    let creator = resolve_creator(config, creator)?;
    let (market, bump, yes_mint, no_mint) = market_addresses(config, &creator);

    println!("{}", "=== Market PDAs ===".bright_green().bold());
    println!("{} {}", "Program:".bright_cyan(), config.program_id);
    println!("{} {}", "Creator:".bright_cyan(), creator);
    println!("{} {} (bump {})", "Market:".bright_cyan(), market, bump);
    println!("{} {}", "YES Mint:".bright_cyan(), yes_mint);
    println!("{} {}", "NO Mint:".bright_cyan(), no_mint);
    Ok(())
}

fn fetch_market_state(config: &NetworkConfig, address: &Pubkey) -> Result<MarketState> {
    let data = client::get_account_data(config, address)
        .context("Failed to fetch market account - does it exist?")?;
    MarketState::decode(&data).with_context(|| format!("Failed to decode market {}", address))
}

pub async fn show_market(config: &NetworkConfig, market: String) -> Result<()> {
    let address = parse_pubkey(&market, "market")?;
    let state = fetch_market_state(config, &address)?;

    display::print_market(&state.to_market(&address)?);
    println!("{} {} lamports", "Real SOL Reserves:".bright_cyan(), state.real_sol_reserves);
    println!("{} {}", "Real Token Reserves:".bright_cyan(), state.real_token_reserves);
    println!("{} {}", "Bump:".bright_cyan(), state.bump);
    Ok(())
}

pub async fn initialize_market(config: &NetworkConfig, title: String, image: String) -> Result<()> {
    let creator = config.signer()?.pubkey();
    let (market, _) = program::derive_market_pda(&config.program_id, &creator);

    println!("{}", "=== Initialize Market ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!("{} {}", "Title:".bright_cyan(), title);
    println!("{} {}", "Market:".bright_cyan(), client::format_pubkey(&market));

    let ix = program::initialize_market_ix(&config.program_id, &creator, &title, &image);
    let signature = client::send_and_confirm_transaction(config, vec![ix]).await?;

    println!("\n{} {}", "Success!".bright_green().bold(), "✓".bright_green());
    println!("{} {}", "Signature:".bright_cyan(), client::format_signature(&signature, config));
    Ok(())
}

pub async fn buy(config: &NetworkConfig, market: String, side: Side, amount_sol: f64) -> Result<()> {
    let address = parse_pubkey(&market, "market")?;
    let lamports = client::sol_to_lamports(amount_sol)?;
    let buyer = config.signer()?.pubkey();

    let wallet_balance = client::get_balance(config, &buyer)?;
    if wallet_balance < lamports {
        anyhow::bail!(
            "Insufficient SOL: need {} SOL, wallet holds {} SOL",
            amount_sol,
            client::lamports_to_sol(wallet_balance)
        );
    }

    let state = fetch_market_state(config, &address)?;
    if state.resolved {
        anyhow::bail!("Market {} is resolved; trading is closed", address);
    }

    let expected = cpmm::quote_buy(state.yes_reserves, state.no_reserves, side, lamports)
        .map_err(|e| anyhow::anyhow!("Cannot quote trade: {}", e))?;
    let price_after = cpmm::implied_price(expected.new_yes, expected.new_no, side)
        .map_err(|e| anyhow::anyhow!("Cannot price trade: {}", e))?;

    println!("{}", format!("=== Buy {} ===", side.as_str()).bright_green().bold());
    println!("{} {}", "Market:".bright_cyan(), state.title);
    println!("{} {} SOL ({} lamports)", "Amount:".bright_cyan(), amount_sol, lamports);
    println!("{} {}", "Expected Tokens:".bright_cyan(), expected.tokens_out);
    println!("{} {:.2}%", "Price After:".bright_cyan(), price_after * 100.0);

    let ix = program::buy_ix(&config.program_id, &address, &buyer, side, lamports);
    let signature = client::send_and_confirm_transaction(config, vec![ix]).await?;

    println!("{} {}", "Signature:".bright_cyan(), client::format_signature(&signature, config));
    Ok(())
}
