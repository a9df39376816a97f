//! Network configuration and keypair management

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// USDC/USDT/UPFI pool on mainnet
pub const DEFAULT_SWAP_INFO: &str = "GmfrfDZrcBHTyYKejQfLvb4AL3g4WT1SFqjiMmM6RJTZ";

#[derive(Debug)]
pub struct NetworkConfig {
    pub network: String,
    pub rpc_url: String,
    pub ws_url: String,
    pub keypair: Keypair,
    pub keypair_path: PathBuf,
    pub swap_info_address: Pubkey,
    /// When set, the pool account owner must match; otherwise the owner
    /// observed on chain is taken as the swap program.
    pub swap_program_id: Option<Pubkey>,
}

impl NetworkConfig {
    pub fn new(
        network: &str,
        rpc_url: Option<String>,
        keypair_path: Option<PathBuf>,
        pool: Option<String>,
        program: Option<String>,
    ) -> Result<Self> {
        let (default_rpc, ws_url) = match network {
            "localnet" | "local" => (
                "http://127.0.0.1:8899".to_string(),
                "ws://127.0.0.1:8900".to_string(),
            ),
            "devnet" => (
                "https://api.devnet.solana.com".to_string(),
                "wss://api.devnet.solana.com".to_string(),
            ),
            "mainnet-beta" | "mainnet" => (
                "https://api.mainnet-beta.solana.com".to_string(),
                "wss://api.mainnet-beta.solana.com".to_string(),
            ),
            _ => anyhow::bail!(
                "Unknown network: {}. Use localnet, devnet, or mainnet-beta",
                network
            ),
        };

        let rpc_url = rpc_url.unwrap_or(default_rpc);

        // Resolve keypair path, expanding a leading ~ from shell-style args
        let keypair_path = if let Some(path) = keypair_path {
            PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
        } else {
            // Try default Solana CLI config location
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config/solana/id.json")
        };

        let keypair = load_keypair(&keypair_path)?;

        let swap_info_address = match pool {
            Some(address) => Pubkey::from_str(&address)
                .with_context(|| format!("Invalid pool address: {}", address))?,
            None => Pubkey::from_str(DEFAULT_SWAP_INFO).expect("Invalid default pool address"),
        };

        let swap_program_id = program
            .map(|id| {
                Pubkey::from_str(&id).with_context(|| format!("Invalid swap program ID: {}", id))
            })
            .transpose()?;

        Ok(Self {
            network: network.to_string(),
            rpc_url,
            ws_url,
            keypair,
            keypair_path,
            swap_info_address,
            swap_program_id,
        })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Load a keypair from a JSON file
fn load_keypair(path: &Path) -> Result<Keypair> {
    if !path.exists() {
        anyhow::bail!(
            "Keypair file not found: {}\n\
             Create one with: solana-keygen new --outfile {}",
            path.display(),
            path.display()
        );
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

    let bytes: Vec<u8> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse keypair JSON: {}", path.display()))?;

    Keypair::from_bytes(&bytes)
        .with_context(|| format!("Invalid keypair data in: {}", path.display()))
}
