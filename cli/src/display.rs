//! Terminal rendering of markets, trades and the profile

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use market_model::{Preview, Side, Winner};
use std::future::Future;
use std::time::Duration;

use crate::market::{Market, Position, Trade, UserProfile};
use crate::store::Redemption;
use crate::wallet::Wallet;

/// Run `fut` behind a spinner, cleared once it completes
pub async fn with_spinner<F, T>(message: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let output = fut.await;
    spinner.finish_and_clear();
    output
}

pub fn format_time(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(ts) => ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

fn percent(price: f64) -> String {
    format!("{:.1}%", price * 100.0)
}

fn short(key: &str) -> String {
    if key.len() <= 12 {
        return key.to_string();
    }
    format!("{}...{}", &key[..6], &key[key.len() - 4..])
}

fn signed(value: f64) -> colored::ColoredString {
    let text = format!("{}{:.2} SOL", if value > 0.0 { "+" } else { "" }, value);
    if value >= 0.0 {
        text.bright_green()
    } else {
        text.bright_red()
    }
}

fn status(market: &Market) -> colored::ColoredString {
    match (market.resolved, market.winner) {
        (false, _) => "OPEN".bright_green(),
        (true, Winner::Yes) => "RESOLVED: YES".bright_yellow(),
        (true, Winner::No) => "RESOLVED: NO".bright_yellow(),
        (true, Winner::Open) => "RESOLVED".bright_yellow(),
    }
}

pub fn print_markets(markets: &[Market]) {
    if markets.is_empty() {
        println!("{}", "No markets".dimmed());
        return;
    }

    for market in markets {
        println!(
            "{}  {}  {} {}  {} {}  {} {:.1}◎  {} {:.1}◎  {}",
            short(&market.public_key).bright_blue(),
            market.title.bold(),
            "YES".bright_green(),
            percent(market.yes_price),
            "NO".bright_red(),
            percent(market.no_price),
            "Vol".dimmed(),
            market.volume,
            "Liq".dimmed(),
            market.liquidity,
            status(market),
        );
    }
}

pub fn print_market(market: &Market) {
    println!("{}", format!("=== {} ===", market.title).bright_green().bold());
    println!("{} {}", "Market:".bright_cyan(), market.public_key);
    println!("{} {}", "Creator:".bright_cyan(), market.creator);
    println!("{} {}", "Created:".bright_cyan(), format_time(market.created_at));
    println!("{} {}", "Image:".bright_cyan(), market.image);
    println!("{} {}", "Status:".bright_cyan(), status(market));
    println!(
        "{} {} / {} {}",
        "YES:".bright_green(),
        percent(market.yes_price),
        "NO:".bright_red(),
        percent(market.no_price)
    );
    println!("{} {:.2} SOL", "Volume:".bright_cyan(), market.volume);
    println!("{} {:.2} SOL", "Liquidity Pool:".bright_cyan(), market.liquidity);
    println!(
        "{} {} YES / {} NO",
        "Reserves:".bright_cyan(),
        market.yes_reserves,
        market.no_reserves
    );
}

pub fn print_trade(trade: &Trade) {
    println!(
        "{} {} {:.2} SOL @ {:.2} → {:.4} tokens",
        "✓".bright_green(),
        trade.kind.side().as_str().bold(),
        trade.amount,
        trade.price,
        trade.tokens_received
    );
    println!("  {} {}", "Tx:".dimmed(), trade.tx_hash.dimmed());
}

pub fn print_trades(trades: &[Trade]) {
    if trades.is_empty() {
        println!("{}", "No trades this session".dimmed());
        return;
    }
    for trade in trades {
        let side = match trade.kind.side() {
            Side::Yes => "BUY YES".bright_green(),
            Side::No => "BUY NO".bright_red(),
        };
        println!(
            "{}  {}  {}  {:.2} SOL @ {:.2}  {}",
            format_time(trade.timestamp).dimmed(),
            side,
            short(&trade.market).bright_blue(),
            trade.amount,
            trade.price,
            short(&trade.tx_hash).dimmed(),
        );
    }
}

pub fn print_positions<'a>(positions: impl Iterator<Item = &'a Position>) {
    let mut any = false;
    for position in positions {
        any = true;
        println!(
            "{}  {}  {:.4} tokens  cost {:.4} SOL",
            short(&position.market).bright_blue(),
            position.side.as_str().bold(),
            position.tokens,
            position.cost
        );
    }
    if !any {
        println!("{}", "No open positions".dimmed());
    }
}

pub fn print_preview(side: Side, amount: f64, preview: &Preview) {
    println!("{}", "=== Trade Preview ===".bright_green().bold());
    println!("{} {} {:.2} SOL", "Buy:".bright_cyan(), side.as_str(), amount);
    println!("{} {:.1}x", "Payout:".bright_cyan(), preview.payout_multiplier);
    println!("{} {:.2} SOL", "Potential Return:".bright_cyan(), preview.potential_return);
    println!("{} {:.4}%", "LP Share:".bright_cyan(), preview.liquidity_share_pct);
}

pub fn print_profile(wallet: Option<&Wallet>, balance: f64, profile: &UserProfile) {
    println!("{}", "=== Profile ===".bright_green().bold());
    match wallet {
        Some(w) if w.demo => println!("{} {} {}", "Wallet:".bright_cyan(), w.address, "(demo)".dimmed()),
        Some(w) => println!("{} {}", "Wallet:".bright_cyan(), w.address),
        None => println!("{} {}", "Wallet:".bright_cyan(), "not connected".yellow()),
    }
    println!("{} {:.4} SOL", "Balance:".bright_cyan(), balance);
    println!("{} {}", "Realized PnL:".bright_cyan(), signed(profile.realized_pnl));
    println!("{} {}", "Unrealized PnL:".bright_cyan(), signed(profile.unrealized_pnl));
    println!("{} {:.2} SOL", "Total Volume:".bright_cyan(), profile.total_volume);
    println!("{} {:.2} SOL", "Total Deposited:".bright_cyan(), profile.total_deposited);
    println!("{} {:.2} SOL", "Total Withdrawn:".bright_cyan(), profile.total_withdrawn);
}

pub fn print_redemption(redemption: &Redemption) {
    println!(
        "{} Redeemed {} ({:?} won): {:.4} SOL paid, PnL {}",
        "✓".bright_green(),
        short(&redemption.market).bright_blue(),
        redemption.winner,
        redemption.payout,
        signed(redemption.pnl())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_keys() {
        assert_eq!(short("abc"), "abc");
        assert_eq!(
            short("So11111111111111111111111111111111111111112"),
            "So1111...1112"
        );
    }

    #[test]
    fn test_format_time() {
        assert_ne!(format_time(0), "-");
        assert_eq!(format_time(i64::MAX), "-");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.65), "65.0%");
    }
}
