//! Solcasts CLI - Binary prediction markets on Solana
//!
//! Runs a simulated market session (create markets, trade YES/NO against the
//! bonding curve, resolve, redeem, move funds) and talks to the deployed
//! Solcasts program on localnet, devnet or mainnet.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod chain;
mod client;
mod config;
mod display;
mod error;
mod market;
mod program;
mod session;
mod smoke;
mod store;
mod wallet;

use config::{NetworkConfig, SessionConfig};
use market::MarketSort;
use session::SideArg;
use store::MarketStore;
use wallet::Wallet;

#[derive(Parser)]
#[command(name = "solcasts")]
#[command(about = "Solcasts CLI - Trade and create binary prediction markets", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (localnet, devnet, mainnet-beta)
    #[arg(short, long, default_value = "devnet")]
    network: String,

    /// RPC URL (overrides network default)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to keypair file
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Solcasts program id (overrides the built-in default)
    #[arg(long)]
    program_id: Option<String>,

    /// Session config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List markets of a fresh session
    Markets {
        /// Listing order
        #[arg(long, value_enum, default_value_t = MarketSort::Trending)]
        sort: MarketSort,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Preview a trade
    Quote {
        /// Market key or unique key prefix
        market: String,

        /// Side to buy
        #[arg(long, value_enum)]
        side: SideArg,

        /// Amount in SOL
        #[arg(long)]
        amount: f64,
    },

    /// Start an interactive session
    Session,

    /// Run the scripted smoke test over a simulated session
    Smoke {
        /// Skip simulated network latency
        #[arg(long)]
        fast: bool,
    },

    /// Solcasts program operations
    Chain {
        #[command(subcommand)]
        command: ChainCommands,
    },
}

#[derive(Subcommand)]
enum ChainCommands {
    /// Derive market and mint PDAs for a creator
    Pdas {
        /// Creator address (defaults to the configured keypair)
        creator: Option<String>,
    },

    /// Fetch and decode a market account
    Show {
        /// Market address
        market: String,
    },

    /// Initialize the market owned by the configured keypair
    Init {
        /// Market question
        #[arg(long)]
        title: String,

        /// Image URL
        #[arg(long, default_value = "")]
        image: String,
    },

    /// Buy YES or NO tokens
    Buy {
        /// Market address
        market: String,

        /// Side to buy
        #[arg(long, value_enum)]
        side: SideArg,

        /// Amount in SOL
        #[arg(long)]
        amount: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // Initialize network and session configuration
    let config = NetworkConfig::new(
        &cli.network,
        cli.url.clone(),
        cli.keypair.clone(),
        cli.program_id.clone(),
    )?;
    let session_config = SessionConfig::load(cli.config.as_deref())?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "RPC URL:".bright_cyan(), config.rpc_url);
        println!("{} {}", "WS URL:".bright_cyan(), config.ws_url);
        println!("{} {}", "Keypair:".bright_cyan(), config.keypair_path.display());
        println!("{} {}", "Program:".bright_cyan(), config.program_id);
    }

    // Execute command
    match cli.command {
        Commands::Markets { sort, json } => {
            let mut store = MarketStore::new(&session_config);
            let markets = display::with_spinner("Fetching markets...", store.fetch_markets(sort)).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&markets).context("Failed to encode markets")?);
            } else {
                display::print_markets(&markets);
            }
        }
        Commands::Quote { market, side, amount } => {
            let mut store = MarketStore::new(&session_config.without_latency());
            store.fetch_markets(MarketSort::Trending).await;
            let key = store.find_market(&market)?.public_key.clone();
            let preview = store.quote(&key, side.into(), amount)?;
            display::print_preview(side.into(), amount, &preview);
        }
        Commands::Session => {
            session::run_session(&config, session_config).await?;
        }
        Commands::Smoke { fast } => {
            let session_config = if fast { session_config.without_latency() } else { session_config };
            smoke::run_smoke_tests(session_config, Wallet::connect(&config)).await?;
        }
        Commands::Chain { command } => {
            match command {
                ChainCommands::Pdas { creator } => {
                    chain::show_pdas(&config, creator).await?;
                }
                ChainCommands::Show { market } => {
                    chain::show_market(&config, market).await?;
                }
                ChainCommands::Init { title, image } => {
                    chain::initialize_market(&config, title, image).await?;
                }
                ChainCommands::Buy { market, side, amount } => {
                    chain::buy(&config, market, side.into(), amount).await?;
                }
            }
        }
    }

    Ok(())
}
