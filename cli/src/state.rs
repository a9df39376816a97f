//! On-chain account layouts for the stable-swap program
//!
//! The pool account is an Anchor account: an 8-byte discriminator
//! followed by borsh-encoded fields, all little-endian with no padding.
//! The corpus carries no borsh dependency, so the layout is read with a
//! small byte cursor instead.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Anchor account discriminator: sha256("account:SwapInfo")[..8]
pub const SWAP_INFO_DISCRIMINATOR: [u8; 8] = [0xcc, 0x73, 0x06, 0x06, 0xd1, 0xe2, 0x29, 0xf2];

/// Serialized footprint of one token entry: three pubkeys plus a u64
const TOKEN_INFO_LEN: usize = 104;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("account data truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("account discriminator mismatch (not a SwapInfo account)")]
    BadDiscriminator,
    #[error("token entry count {got} does not match n_coins {expected}")]
    TokenCountMismatch { expected: u64, got: u64 },
}

/// Fee schedule, every rate a numerator over the model's fee denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    pub admin_trade_fee: u64,
    pub admin_deposit_fee: u64,
    pub admin_withdraw_fee: u64,
    pub trade_fee: u64,
    pub normalized_fee: u64,
}

/// One pool token: its mint, vault, admin fee account and stored balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub token_mint: Pubkey,
    pub token_vault: Pubkey,
    pub admin_fee_account: Pubkey,
    pub balance: u64,
}

/// Parsed pool account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapInfo {
    pub is_initialized: bool,
    pub is_paused: bool,
    pub bump: u8,
    pub initial_amp_factor: u64,
    pub target_amp_factor: u64,
    pub start_ramp_ts: i64,
    pub stop_ramp_ts: i64,
    pub pool_mint: Pubkey,
    pub future_admin_deadline: i64,
    pub future_admin_key: Pubkey,
    pub admin_key: Pubkey,
    pub fees: Fees,
    pub n_coins: u64,
    pub tokens: Vec<TokenInfo>,
}

impl SwapInfo {
    /// Parse the account data, verifying the discriminator and that the
    /// token vector length matches the stored coin count.
    pub fn try_deserialize(data: &[u8]) -> Result<Self, StateError> {
        let mut reader = ByteReader::new(data);

        if reader.read_bytes::<8>()? != SWAP_INFO_DISCRIMINATOR {
            return Err(StateError::BadDiscriminator);
        }

        let is_initialized = reader.read_u8()? != 0;
        let is_paused = reader.read_u8()? != 0;
        let bump = reader.read_u8()?;
        let initial_amp_factor = reader.read_u64()?;
        let target_amp_factor = reader.read_u64()?;
        let start_ramp_ts = reader.read_i64()?;
        let stop_ramp_ts = reader.read_i64()?;
        let pool_mint = reader.read_pubkey()?;
        let future_admin_deadline = reader.read_i64()?;
        let future_admin_key = reader.read_pubkey()?;
        let admin_key = reader.read_pubkey()?;

        let fees = Fees {
            admin_trade_fee: reader.read_u64()?,
            admin_deposit_fee: reader.read_u64()?,
            admin_withdraw_fee: reader.read_u64()?,
            trade_fee: reader.read_u64()?,
            normalized_fee: reader.read_u64()?,
        };

        let n_coins = reader.read_u64()?;
        let token_count = reader.read_u32()? as u64;
        if token_count != n_coins {
            return Err(StateError::TokenCountMismatch {
                expected: n_coins,
                got: token_count,
            });
        }

        // The count is untrusted bytes too; bound it by the bytes actually
        // present before reserving anything
        let needed = (token_count as usize).saturating_mul(TOKEN_INFO_LEN);
        if needed > reader.remaining() {
            return Err(StateError::Truncated {
                offset: reader.offset,
                needed,
            });
        }

        let mut tokens = Vec::with_capacity(token_count as usize);
        for _ in 0..token_count {
            tokens.push(TokenInfo {
                token_mint: reader.read_pubkey()?,
                token_vault: reader.read_pubkey()?,
                admin_fee_account: reader.read_pubkey()?,
                balance: reader.read_u64()?,
            });
        }

        Ok(Self {
            is_initialized,
            is_paused,
            bump,
            initial_amp_factor,
            target_amp_factor,
            start_ramp_ts,
            stop_ramp_ts,
            pool_mint,
            future_admin_deadline,
            future_admin_key,
            admin_key,
            fees,
            n_coins,
            tokens,
        })
    }

    /// Stored per-token balances, in token order. These are the balances
    /// the program quotes against; the vault token accounts are not read.
    pub fn balances(&self) -> Vec<u64> {
        self.tokens.iter().map(|token| token.balance).collect()
    }
}

/// Little-endian cursor over account data
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], StateError> {
        let end = self.offset + N;
        let slice = self
            .data
            .get(self.offset..end)
            .ok_or(StateError::Truncated {
                offset: self.offset,
                needed: N,
            })?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        self.offset = end;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, StateError> {
        Ok(self.read_bytes::<1>()?[0])
    }

    fn read_u32(&mut self) -> Result<u32, StateError> {
        Ok(u32::from_le_bytes(self.read_bytes::<4>()?))
    }

    fn read_u64(&mut self) -> Result<u64, StateError> {
        Ok(u64::from_le_bytes(self.read_bytes::<8>()?))
    }

    fn read_i64(&mut self) -> Result<i64, StateError> {
        Ok(i64::from_le_bytes(self.read_bytes::<8>()?))
    }

    fn read_pubkey(&mut self) -> Result<Pubkey, StateError> {
        Ok(Pubkey::new_from_array(self.read_bytes::<32>()?))
    }
}
