//! Pool account access, quoting, and the swap instruction builder

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::str::FromStr;

use crate::client;
use crate::config::NetworkConfig;
use crate::state::SwapInfo;
use stableswap_model::{compute_d, compute_price, compute_swap_amount_out, FEE_DENOMINATOR};

/// Anchor instruction discriminator: sha256("global:swap")[..8]
pub const SWAP_IX_DISCRIMINATOR: [u8; 8] = [0xf8, 0xc6, 0x9e, 0x91, 0xe1, 0x75, 0x87, 0xc8];

/// SPL token program
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

pub fn token_program_id() -> Pubkey {
    Pubkey::from_str(TOKEN_PROGRAM_ID).expect("Invalid token program ID")
}

/// A pool account bound to an RPC connection
pub struct PoolClient {
    rpc: RpcClient,
    pub swap_program_id: Pubkey,
    pub swap_info_address: Pubkey,
    pub swap_info: SwapInfo,
}

impl PoolClient {
    /// Fetch and parse the pool account. The owning program is taken from
    /// the account itself; a configured `--program` pins it instead.
    pub fn load(config: &NetworkConfig) -> Result<Self> {
        let rpc = client::create_rpc_client(config);
        let account = rpc.get_account(&config.swap_info_address).with_context(|| {
            format!(
                "Failed to fetch pool account: {}",
                config.swap_info_address
            )
        })?;

        // Verify ownership
        if let Some(expected) = config.swap_program_id {
            if account.owner != expected {
                anyhow::bail!(
                    "Pool account {} is owned by {}, expected {}",
                    config.swap_info_address,
                    account.owner,
                    expected
                );
            }
        }

        let swap_info = SwapInfo::try_deserialize(&account.data).with_context(|| {
            format!(
                "Failed to parse pool account: {}",
                config.swap_info_address
            )
        })?;
        if !swap_info.is_initialized {
            anyhow::bail!("Pool {} is not initialized", config.swap_info_address);
        }

        Ok(Self {
            rpc,
            swap_program_id: account.owner,
            swap_info_address: config.swap_info_address,
            swap_info,
        })
    }

    /// Re-fetch the stored token balances
    pub fn fetch_vault_balances(&self) -> Result<Vec<u64>> {
        let account = self
            .rpc
            .get_account(&self.swap_info_address)
            .with_context(|| {
                format!(
                    "Failed to refresh pool account: {}",
                    self.swap_info_address
                )
            })?;
        let swap_info = SwapInfo::try_deserialize(&account.data)
            .context("Failed to parse refreshed pool account")?;
        Ok(swap_info.balances())
    }

    /// Effective exchange rate for swapping `swap_amount` of token `i`
    /// into token `j`, using fresh balances and the target amplification
    pub fn price(&self, swap_amount: u64, i: usize, j: usize) -> Result<f64> {
        let xp = self.fetch_vault_balances()?;
        let rate = compute_price(
            self.swap_info.target_amp_factor,
            swap_amount,
            i,
            j,
            &xp,
            self.swap_info.fees.trade_fee,
        )?;
        Ok(rate)
    }

    /// Net output amount for swapping `swap_amount` of token `i` into `j`
    pub fn swap_amount_out(&self, swap_amount: u64, i: usize, j: usize) -> Result<u64> {
        let xp = self.fetch_vault_balances()?;
        let amount_out = compute_swap_amount_out(
            self.swap_info.target_amp_factor,
            swap_amount,
            i,
            j,
            &xp,
            self.swap_info.fees.trade_fee,
        )?;
        Ok(amount_out)
    }
}

/// Build the swap instruction: discriminator plus two little-endian u64
/// arguments, accounts in the order the program expects.
pub fn swap_instruction(
    program_id: &Pubkey,
    swap_info_address: &Pubkey,
    source_token_wallet: &Pubkey,
    source_token_vault: &Pubkey,
    dest_token_vault: &Pubkey,
    dest_token_wallet: &Pubkey,
    swapper: &Pubkey,
    amount_in: u64,
    min_amount_out: u64,
) -> Instruction {
    let mut instruction_data = Vec::with_capacity(24);
    instruction_data.extend_from_slice(&SWAP_IX_DISCRIMINATOR);
    instruction_data.extend_from_slice(&amount_in.to_le_bytes());
    instruction_data.extend_from_slice(&min_amount_out.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*swap_info_address, false),
            AccountMeta::new(*source_token_wallet, false),
            AccountMeta::new(*source_token_vault, false),
            AccountMeta::new(*dest_token_vault, false),
            AccountMeta::new(*dest_token_wallet, false),
            AccountMeta::new_readonly(*swapper, true),
            AccountMeta::new_readonly(token_program_id(), false),
        ],
        data: instruction_data,
    }
}

#[derive(Serialize)]
struct PoolJson {
    address: String,
    program: String,
    is_initialized: bool,
    is_paused: bool,
    initial_amp_factor: u64,
    target_amp_factor: u64,
    start_ramp_ts: i64,
    stop_ramp_ts: i64,
    pool_mint: String,
    admin_key: String,
    fees: FeesJson,
    tokens: Vec<TokenJson>,
    invariant_d: Option<u128>,
}

#[derive(Serialize)]
struct FeesJson {
    admin_trade_fee: u64,
    admin_deposit_fee: u64,
    admin_withdraw_fee: u64,
    trade_fee: u64,
    normalized_fee: u64,
}

#[derive(Serialize)]
struct TokenJson {
    index: usize,
    mint: String,
    vault: String,
    admin_fee_account: String,
    balance: u64,
}

/// Show pool state and balances
pub async fn show_pool(config: &NetworkConfig, json: bool) -> Result<()> {
    let pool = PoolClient::load(config)?;
    let info = &pool.swap_info;
    let balances = info.balances();
    let invariant_d = compute_d(info.target_amp_factor, &balances).ok();

    if json {
        let view = PoolJson {
            address: pool.swap_info_address.to_string(),
            program: pool.swap_program_id.to_string(),
            is_initialized: info.is_initialized,
            is_paused: info.is_paused,
            initial_amp_factor: info.initial_amp_factor,
            target_amp_factor: info.target_amp_factor,
            start_ramp_ts: info.start_ramp_ts,
            stop_ramp_ts: info.stop_ramp_ts,
            pool_mint: info.pool_mint.to_string(),
            admin_key: info.admin_key.to_string(),
            fees: FeesJson {
                admin_trade_fee: info.fees.admin_trade_fee,
                admin_deposit_fee: info.fees.admin_deposit_fee,
                admin_withdraw_fee: info.fees.admin_withdraw_fee,
                trade_fee: info.fees.trade_fee,
                normalized_fee: info.fees.normalized_fee,
            },
            tokens: info
                .tokens
                .iter()
                .enumerate()
                .map(|(index, token)| TokenJson {
                    index,
                    mint: token.token_mint.to_string(),
                    vault: token.token_vault.to_string(),
                    admin_fee_account: token.admin_fee_account.to_string(),
                    balance: token.balance,
                })
                .collect(),
            invariant_d,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "=== StableSwap Pool ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!("{} {}", "Pool Address:".bright_cyan(), pool.swap_info_address);
    println!("{} {}", "Swap Program:".bright_cyan(), pool.swap_program_id);

    println!("\n{}", "=== Status ===".bright_yellow());
    println!("{} {}", "Initialized:".bright_cyan(), info.is_initialized);
    if info.is_paused {
        println!("{} {}", "Paused:".bright_cyan(), "yes".bright_red().bold());
    } else {
        println!("{} no", "Paused:".bright_cyan());
    }
    println!(
        "{} {} -> {}",
        "Amp Factor:".bright_cyan(),
        info.initial_amp_factor,
        info.target_amp_factor
    );
    println!(
        "{} {} -> {}",
        "Ramp Window:".bright_cyan(),
        info.start_ramp_ts,
        info.stop_ramp_ts
    );
    println!("{} {}", "Pool Mint:".bright_cyan(), info.pool_mint);
    println!("{} {}", "Admin:".bright_cyan(), info.admin_key);

    println!(
        "\n{}",
        format!("=== Fees (per {}) ===", FEE_DENOMINATOR).bright_yellow()
    );
    println!("{} {}", "Trade Fee:".bright_cyan(), info.fees.trade_fee);
    println!(
        "{} {}",
        "Admin Trade Fee:".bright_cyan(),
        info.fees.admin_trade_fee
    );
    println!(
        "{} {}",
        "Admin Deposit Fee:".bright_cyan(),
        info.fees.admin_deposit_fee
    );
    println!(
        "{} {}",
        "Admin Withdraw Fee:".bright_cyan(),
        info.fees.admin_withdraw_fee
    );
    println!(
        "{} {}",
        "Normalized Fee:".bright_cyan(),
        info.fees.normalized_fee
    );

    println!("\n{}", "=== Tokens ===".bright_yellow());
    for (idx, token) in info.tokens.iter().enumerate() {
        println!(
            "{} {}",
            format!("[{}] Mint:", idx).bright_cyan(),
            token.token_mint
        );
        println!("    {} {}", "Vault:".bright_cyan(), token.token_vault);
        println!("    {} {}", "Balance:".bright_cyan(), token.balance);
    }

    match invariant_d {
        Some(d) => println!("\n{} {}", "Invariant D:".bright_cyan(), d),
        None => println!(
            "\n{} {}",
            "Invariant D:".bright_cyan(),
            "unavailable".dimmed()
        ),
    }

    Ok(())
}
