//! StableSwap CLI - Pool inspection and swap tool
//!
//! This CLI quotes and executes swaps against a StableSwap pool on Solana
//! networks (localnet, devnet, mainnet-beta). Quotes are computed locally
//! from the on-chain pool state with the same fixed-point math the program
//! runs, so a quoted amount matches what the swap instruction delivers.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod config;
mod client;
mod state;
mod pool;
mod quote;
mod swap;

use config::NetworkConfig;

#[derive(Parser)]
#[command(name = "stableswap")]
#[command(about = "StableSwap CLI - Inspect pools, quote prices, and swap", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (localnet, devnet, mainnet-beta)
    #[arg(short, long, default_value = "mainnet-beta")]
    network: String,

    /// RPC URL (overrides network default)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to keypair file
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Pool (SwapInfo) account address
    #[arg(short, long)]
    pool: Option<String>,

    /// Expected swap program ID (verified against the pool account owner)
    #[arg(long)]
    program: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool state, fees, and balances
    Pool {
        /// Emit JSON instead of the formatted report
        #[arg(long)]
        json: bool,
    },

    /// Show the effective exchange rate for a swap
    Price {
        /// Amount of the source token to price (base units)
        amount: u64,

        /// Source token index
        from: usize,

        /// Destination token index
        to: usize,
    },

    /// Show the net output amount for a swap
    Quote {
        /// Amount of the source token to swap (base units)
        amount: u64,

        /// Source token index
        from: usize,

        /// Destination token index
        to: usize,
    },

    /// Execute a swap
    Swap {
        /// Amount of the source token to swap (base units)
        amount: u64,

        /// Source token index
        from: usize,

        /// Destination token index
        to: usize,

        /// Lowest acceptable output; defaults to the quoted amount
        #[arg(long)]
        min_out: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // Initialize network configuration
    let config = NetworkConfig::new(
        &cli.network,
        cli.url.clone(),
        cli.keypair.clone(),
        cli.pool.clone(),
        cli.program.clone(),
    )?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "RPC URL:".bright_cyan(), config.rpc_url);
        println!("{} {}", "Keypair:".bright_cyan(), config.keypair_path.display());
        println!("{} {}", "Pool:".bright_cyan(), config.swap_info_address);
    }

    // Execute command
    match cli.command {
        Commands::Pool { json } => {
            pool::show_pool(&config, json).await?;
        }
        Commands::Price { amount, from, to } => {
            quote::show_price(&config, amount, from, to).await?;
        }
        Commands::Quote { amount, from, to } => {
            quote::show_quote(&config, amount, from, to).await?;
        }
        Commands::Swap { amount, from, to, min_out } => {
            swap::execute_swap(&config, amount, from, to, min_out).await?;
        }
    }

    Ok(())
}
