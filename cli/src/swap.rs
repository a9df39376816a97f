//! Swap execution against a live pool

use anyhow::{Context, Result};
use colored::Colorize;
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use std::str::FromStr;

use crate::client;
use crate::config::NetworkConfig;
use crate::pool::{self, token_program_id, PoolClient};
use crate::quote;

/// SPL associated token account program
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

pub fn associated_token_program_id() -> Pubkey {
    Pubkey::from_str(ASSOCIATED_TOKEN_PROGRAM_ID).expect("Invalid associated token program ID")
}

/// Derive the associated token account for a wallet and mint
pub fn derive_associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            wallet.as_ref(),
            token_program_id().as_ref(),
            mint.as_ref(),
        ],
        &associated_token_program_id(),
    )
    .0
}

/// Quote, build, sign, and send a swap transaction
pub async fn execute_swap(
    config: &NetworkConfig,
    amount: u64,
    from: usize,
    to: usize,
    min_out: Option<u64>,
) -> Result<()> {
    let pool = PoolClient::load(config)?;
    quote::check_token_indices(&pool.swap_info, from, to)?;

    if pool.swap_info.is_paused {
        anyhow::bail!("Pool {} is paused; swaps are disabled", pool.swap_info_address);
    }

    let source_mint = pool.swap_info.tokens[from].token_mint;
    let dest_mint = pool.swap_info.tokens[to].token_mint;
    let swapper = config.pubkey();
    let source_wallet = derive_associated_token_address(&swapper, &source_mint);
    let dest_wallet = derive_associated_token_address(&swapper, &dest_mint);

    if !client::account_exists(config, &source_wallet) {
        anyhow::bail!(
            "Source token account {} does not exist. Fund {} with the source token first",
            source_wallet,
            swapper
        );
    }
    if !client::account_exists(config, &dest_wallet) {
        anyhow::bail!(
            "Destination token account {} does not exist. Create it with: spl-token create-account {}",
            dest_wallet,
            dest_mint
        );
    }

    let quoted = pool.swap_amount_out(amount, from, to)?;
    let min_amount_out = min_out.unwrap_or(quoted);

    println!("{}", "=== Swap ===".bright_green().bold());
    println!("{} {}", "Pool:".bright_cyan(), pool.swap_info_address);
    println!("{} {}", "From Mint:".bright_cyan(), source_mint);
    println!("{} {}", "To Mint:".bright_cyan(), dest_mint);
    println!("{} {}", "Amount In:".bright_cyan(), amount);
    println!("{} {}", "Expected Out:".bright_cyan(), quoted);
    println!("{} {}", "Min Amount Out:".bright_cyan(), min_amount_out);
    println!("{} {}", "Swapper:".bright_cyan(), swapper);

    let instruction = pool::swap_instruction(
        &pool.swap_program_id,
        &pool.swap_info_address,
        &source_wallet,
        &pool.swap_info.tokens[from].token_vault,
        &pool.swap_info.tokens[to].token_vault,
        &dest_wallet,
        &swapper,
        amount,
        min_amount_out,
    );

    let rpc = client::create_rpc_client(config);
    let blockhash = rpc
        .get_latest_blockhash()
        .context("Failed to fetch latest blockhash")?;
    let transaction = Transaction::new_signed_with_payer(
        &[instruction],
        Some(&swapper),
        &[&config.keypair],
        blockhash,
    );

    println!("\n{}", "Sending swap transaction...".dimmed());
    let signature = rpc
        .send_and_confirm_transaction(&transaction)
        .context("Swap transaction failed")?;

    println!(
        "{} {}",
        "Swap confirmed:".bright_green(),
        client::format_signature(&signature, &config.network)
    );

    Ok(())
}
