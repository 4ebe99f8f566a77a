//! Market Model - Pure pricing math for binary (YES/NO) prediction markets
//!
//! This crate holds the pricing functions shared by the session store and
//! the on-chain client:
//!
//! - [`linear`]: the linear impact curve used by the simulated market store
//! - [`cpmm`]: the constant product curve (`yes * no = k`) over the outcome
//!   token reserves of an on-chain `MarketState`
//! - [`payout`]: redemption value of outcome tokens after resolution
//!
//! No allocation, no panics on user input, all functions total.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod cpmm;
pub mod linear;
pub mod payout;

pub use cpmm::{quote_buy, SwapResult};
pub use linear::{apply_buy, preview, CurveState, Fill, Preview};
pub use payout::redemption_value;

/// Outcome side a trade buys into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

/// Resolution state of a market, encoded as in the account layout
/// (0 = open, 1 = YES won, 2 = NO won)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Winner {
    #[default]
    Open = 0,
    Yes = 1,
    No = 2,
}

impl Winner {
    pub fn from_u8(value: u8) -> Option<Winner> {
        match value {
            0 => Some(Winner::Open),
            1 => Some(Winner::Yes),
            2 => Some(Winner::No),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The winning side, if the market has one
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Open => None,
            Winner::Yes => Some(Side::Yes),
            Winner::No => Some(Side::No),
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Yes => Winner::Yes,
            Side::No => Winner::No,
        }
    }
}

/// Error types for pricing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// Amount is negative, NaN or infinite
    InvalidAmount,
    /// Price outside [0, 1] or not finite
    InvalidPrice,
    /// Invalid reserves (zero)
    InvalidReserves,
    /// Insufficient liquidity in pool
    InsufficientLiquidity,
    /// Trade would drive a reserve below zero
    ReserveDepleted,
    /// Arithmetic overflow
    Overflow,
}

impl core::fmt::Display for ModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ModelError::InvalidAmount => "amount must be a finite, non-negative number",
            ModelError::InvalidPrice => "price must be a finite number in [0, 1]",
            ModelError::InvalidReserves => "reserves must be non-zero",
            ModelError::InsufficientLiquidity => "insufficient liquidity in pool",
            ModelError::ReserveDepleted => "trade would deplete the outcome reserve",
            ModelError::Overflow => "arithmetic overflow",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_roundtrip_codes() {
        assert_eq!(Winner::from_u8(0), Some(Winner::Open));
        assert_eq!(Winner::from_u8(1), Some(Winner::Yes));
        assert_eq!(Winner::from_u8(2), Some(Winner::No));
        assert_eq!(Winner::from_u8(3), None);
        assert_eq!(Winner::from(Side::No).as_u8(), 2);
        assert_eq!(Winner::Open.side(), None);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Yes.opposite(), Side::No);
        assert_eq!(Side::No.opposite().as_str(), "YES");
        assert_eq!(Side::No.opposite().opposite(), Side::No);
    }
}
