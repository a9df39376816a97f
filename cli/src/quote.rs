//! Read-only price and quote commands

use anyhow::Result;
use colored::Colorize;

use crate::config::NetworkConfig;
use crate::pool::PoolClient;
use crate::state::SwapInfo;
use stableswap_model::FEE_DENOMINATOR;

/// Reject indices the pool does not hold before any math runs
pub(crate) fn check_token_indices(info: &SwapInfo, from: usize, to: usize) -> Result<()> {
    let n_coins = info.tokens.len();
    if from >= n_coins || to >= n_coins {
        anyhow::bail!("Token index out of range: pool holds {} tokens", n_coins);
    }
    if from == to {
        anyhow::bail!("Source and destination tokens must differ");
    }
    Ok(())
}

/// Show the effective exchange rate for a hypothetical swap
pub async fn show_price(config: &NetworkConfig, amount: u64, from: usize, to: usize) -> Result<()> {
    let pool = PoolClient::load(config)?;
    check_token_indices(&pool.swap_info, from, to)?;

    let rate = pool.price(amount, from, to)?;

    println!("{}", "=== Swap Price ===".bright_green().bold());
    println!("{} {}", "Pool:".bright_cyan(), pool.swap_info_address);
    println!(
        "{} {}",
        "From Mint:".bright_cyan(),
        pool.swap_info.tokens[from].token_mint
    );
    println!(
        "{} {}",
        "To Mint:".bright_cyan(),
        pool.swap_info.tokens[to].token_mint
    );
    println!("{} {}", "Amount In:".bright_cyan(), amount);
    println!("{} {:.6}", "Price:".bright_cyan(), rate);

    if pool.swap_info.is_paused {
        println!("\n{}", "Pool is paused; swaps are disabled".bright_red());
    }

    Ok(())
}

/// Show the net output amount for a hypothetical swap
pub async fn show_quote(config: &NetworkConfig, amount: u64, from: usize, to: usize) -> Result<()> {
    let pool = PoolClient::load(config)?;
    check_token_indices(&pool.swap_info, from, to)?;

    let amount_out = pool.swap_amount_out(amount, from, to)?;

    println!("{}", "=== Swap Quote ===".bright_green().bold());
    println!("{} {}", "Pool:".bright_cyan(), pool.swap_info_address);
    println!(
        "{} {}",
        "From Mint:".bright_cyan(),
        pool.swap_info.tokens[from].token_mint
    );
    println!(
        "{} {}",
        "To Mint:".bright_cyan(),
        pool.swap_info.tokens[to].token_mint
    );
    println!("{} {}", "Amount In:".bright_cyan(), amount);
    println!("{} {}", "Amount Out:".bright_cyan(), amount_out);
    println!(
        "{} {} / {}",
        "Trade Fee:".bright_cyan(),
        pool.swap_info.fees.trade_fee,
        FEE_DENOMINATOR
    );

    if pool.swap_info.is_paused {
        println!("\n{}", "Pool is paused; swaps are disabled".bright_red());
    }

    Ok(())
}
