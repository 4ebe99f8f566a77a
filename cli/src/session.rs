//! Interactive shell over one in-memory market store
//!
//! State lives only as long as the shell: markets created, trades placed and
//! balances moved are gone once it exits.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use market_model::{Side, Winner};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{NetworkConfig, SessionConfig};
use crate::display;
use crate::market::MarketSort;
use crate::store::MarketStore;
use crate::wallet::Wallet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Yes,
    No,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Yes => Side::Yes,
            SideArg::No => Side::No,
        }
    }
}

impl From<SideArg> for Winner {
    fn from(side: SideArg) -> Self {
        Winner::from(Side::from(side))
    }
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum SessionCommand {
    /// Connect the session wallet
    Connect,

    /// List markets
    Markets {
        #[arg(long, value_enum, default_value_t = MarketSort::Trending)]
        sort: MarketSort,
    },

    /// Show one market
    Show {
        /// Market key or unique key prefix
        market: String,
    },

    /// Create a market
    Create {
        /// Question the market resolves on
        title: String,

        /// Image URL
        #[arg(long, default_value = "")]
        image: String,
    },

    /// Buy YES or NO with SOL
    Buy {
        market: String,
        #[arg(value_enum)]
        side: SideArg,
        /// Amount in SOL
        amount: f64,
    },

    /// Preview a trade
    Quote {
        market: String,
        #[arg(value_enum)]
        side: SideArg,
        amount: f64,
    },

    /// Resolve a market
    Resolve {
        market: String,
        #[arg(value_enum)]
        winner: SideArg,
    },

    /// Redeem positions in a resolved market
    Redeem { market: String },

    /// Deposit SOL into the session wallet
    Deposit { amount: f64 },

    /// Withdraw SOL from the session wallet
    Withdraw { amount: f64 },

    /// Show wallet balance
    Balance,

    /// Show profile and PnL
    Profile,

    /// Show trades placed this session
    Trades,

    /// Show open positions
    Positions,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

enum Flow {
    Continue,
    Exit,
}

/// Split a command line on whitespace, keeping double-quoted runs together
fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        anyhow::bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

pub async fn run_session(network: &NetworkConfig, session: SessionConfig) -> Result<()> {
    let mut store = MarketStore::new(&session);

    println!("{}", "=== Solcasts Session ===".bright_green().bold());
    println!("{}", "Type `help` for commands, `exit` to leave.".dimmed());

    let markets = display::with_spinner("Loading markets...", store.fetch_markets(MarketSort::Trending)).await;
    display::print_markets(&markets);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "solcasts>".bright_cyan());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        let words = match split_line(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                println!("{} {}", "✗".bright_red(), e);
                continue;
            }
        };

        let command = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Renders help and usage errors alike
                if let Err(io) = e.print() {
                    println!("{} {}", "✗".bright_red(), io);
                }
                continue;
            }
        };

        match execute(&mut store, network, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => println!("{} {}", "✗".bright_red(), e),
        }
    }

    println!("{}", "Session closed; all state discarded.".dimmed());
    Ok(())
}

async fn execute(store: &mut MarketStore, network: &NetworkConfig, command: SessionCommand) -> Result<Flow> {
    match command {
        SessionCommand::Connect => {
            let wallet = Wallet::connect(network);
            println!("{} {}", "Connected:".bright_green(), wallet.address);
            store.connect_wallet(wallet);
        }
        SessionCommand::Markets { sort } => {
            let markets = display::with_spinner("Fetching markets...", store.fetch_markets(sort)).await;
            display::print_markets(&markets);
        }
        SessionCommand::Show { market } => {
            display::print_market(store.find_market(&market)?);
        }
        SessionCommand::Create { title, image } => {
            let market = display::with_spinner("Creating market...", store.create_market(&title, &image)).await?;
            println!("{} Market created", "✓".bright_green());
            display::print_market(&market);
        }
        SessionCommand::Buy { market, side, amount } => {
            let key = store.find_market(&market)?.public_key.clone();
            let trade = display::with_spinner("Submitting trade...", store.buy(&key, side.into(), amount)).await?;
            display::print_trade(&trade);
        }
        SessionCommand::Quote { market, side, amount } => {
            let key = store.find_market(&market)?.public_key.clone();
            let preview = store.quote(&key, side.into(), amount)?;
            display::print_preview(side.into(), amount, &preview);
        }
        SessionCommand::Resolve { market, winner } => {
            let key = store.find_market(&market)?.public_key.clone();
            let market = display::with_spinner("Resolving market...", store.resolve_market(&key, winner.into())).await?;
            println!("{} Market resolved", "✓".bright_green());
            display::print_market(&market);
        }
        SessionCommand::Redeem { market } => {
            let key = store.find_market(&market)?.public_key.clone();
            let redemption = display::with_spinner("Redeeming...", store.redeem(&key)).await?;
            display::print_redemption(&redemption);
        }
        SessionCommand::Deposit { amount } => {
            let balance = display::with_spinner("Depositing...", store.deposit(amount)).await?;
            println!("{} Balance: {:.4} SOL", "✓".bright_green(), balance);
        }
        SessionCommand::Withdraw { amount } => {
            let balance = display::with_spinner("Withdrawing...", store.withdraw(amount)).await?;
            println!("{} Balance: {:.4} SOL", "✓".bright_green(), balance);
        }
        SessionCommand::Balance => {
            println!("{} {:.4} SOL", "Balance:".bright_cyan(), store.balance());
        }
        SessionCommand::Profile => {
            display::print_profile(store.wallet(), store.balance(), &store.profile());
        }
        SessionCommand::Trades => display::print_trades(store.trades()),
        SessionCommand::Positions => display::print_positions(store.positions()),
        SessionCommand::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}
