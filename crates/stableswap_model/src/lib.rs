//! StableSwap model - Pure invariant math for pools of like-valued tokens
//!
//! This crate contains the Curve-style StableSwap formulas the swap client
//! quotes with: the invariant solver `compute_d`, the complementary balance
//! solvers `compute_y` / `compute_y_d`, and the fee-aware swap quotes built
//! on top of them. All arithmetic is unsigned integer math over 256-bit
//! words with floor division, so quotes reproduce on-chain execution
//! bit-for-bit.

#![no_std]

pub mod big_num;
pub mod math;

pub use big_num::U256;
pub use math::{compute_d, compute_price, compute_swap_amount_out, compute_y, compute_y_d};

/// Fee denominator: fees are numerators over 100,000.
pub const FEE_DENOMINATOR: u64 = 100_000;

/// Maximum Newton updates before a solver gives up.
pub const MAX_ITERATIONS: usize = 255;

/// Error types for curve operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// Fewer than two token balances
    InvalidTokenCount,
    /// Token index out of range, or equal indices where distinct ones are required
    InvalidTokenIndex,
    /// Amplification coefficient is zero
    InvalidAmplification,
    /// Trade fee at or above the fee denominator
    InvalidTradeFee,
    /// Swap amount is zero where a positive amount is required
    InvalidSwapAmount,
    /// A balance consumed as a divisor is zero
    ZeroBalance,
    /// Solved output balance exceeds the stored balance
    InsufficientLiquidity,
    /// Iteration cap reached without convergence
    NonConvergence,
    /// Arithmetic overflow (division by zero in derived terms included)
    Overflow,
}

pub type Result<T> = core::result::Result<T, CurveError>;

impl core::fmt::Display for CurveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            CurveError::InvalidTokenCount => "pool must hold at least two tokens",
            CurveError::InvalidTokenIndex => "token index out of range or not distinct",
            CurveError::InvalidAmplification => "amplification coefficient must be positive",
            CurveError::InvalidTradeFee => "trade fee must be below the fee denominator",
            CurveError::InvalidSwapAmount => "swap amount must be positive",
            CurveError::ZeroBalance => "token balance is zero",
            CurveError::InsufficientLiquidity => "insufficient liquidity for requested swap",
            CurveError::NonConvergence => "invariant iteration did not converge",
            CurveError::Overflow => "arithmetic overflow",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for CurveError {}
