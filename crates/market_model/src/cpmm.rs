//! Constant product curve over outcome token reserves (yes·no=k)
//!
//! Buying a side with `dx` lamports mints `dx` of each outcome token into
//! the pool and then withdraws the chosen side until the invariant holds:
//!
//! - opposite' = opposite + dx
//! - chosen'   = ceil(k / opposite')
//! - out       = chosen + dx - chosen'
//!
//! Rounding is in the pool's favour, so `yes'·no' >= yes·no`.

use crate::{ModelError, Side};

/// Virtual reserves each side starts with when a market is initialized
pub const INITIAL_VIRTUAL_RESERVES: u64 = 1_000_000_000_000_000;

/// Result of a buy against the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    /// Outcome tokens paid out to the buyer
    pub tokens_out: u64,
    /// New YES reserve after trade
    pub new_yes: u64,
    /// New NO reserve after trade
    pub new_no: u64,
}

/// Calculate the fill for buying `side` with `amount_in` lamports
///
/// # Arguments
/// * `yes_reserves` - Current YES token reserve
/// * `no_reserves` - Current NO token reserve
/// * `side` - Outcome being bought
/// * `amount_in` - Lamports paid in (must be > 0)
///
/// # Returns
/// * `SwapResult` with tokens out and new reserves
/// * `ModelError` if invalid inputs or the pool cannot fill
pub fn quote_buy(
    yes_reserves: u64,
    no_reserves: u64,
    side: Side,
    amount_in: u64,
) -> Result<SwapResult, ModelError> {
    if yes_reserves == 0 || no_reserves == 0 {
        return Err(ModelError::InvalidReserves);
    }
    if amount_in == 0 {
        return Err(ModelError::InvalidAmount);
    }

    let (chosen, opposite) = match side {
        Side::Yes => (yes_reserves as u128, no_reserves as u128),
        Side::No => (no_reserves as u128, yes_reserves as u128),
    };
    let dx = amount_in as u128;

    let k = chosen.checked_mul(opposite).ok_or(ModelError::Overflow)?;
    let opposite_after = opposite.checked_add(dx).ok_or(ModelError::Overflow)?;

    // ceil(k / opposite_after)
    let chosen_after = k
        .checked_add(opposite_after - 1)
        .ok_or(ModelError::Overflow)?
        / opposite_after;
    if chosen_after == 0 {
        return Err(ModelError::InsufficientLiquidity);
    }

    let tokens_out = chosen + dx - chosen_after;

    if opposite_after > u64::MAX as u128 || tokens_out > u64::MAX as u128 {
        return Err(ModelError::Overflow);
    }

    let (new_yes, new_no) = match side {
        Side::Yes => (chosen_after as u64, opposite_after as u64),
        Side::No => (opposite_after as u64, chosen_after as u64),
    };

    Ok(SwapResult {
        tokens_out: tokens_out as u64,
        new_yes,
        new_no,
    })
}

/// Implied probability of `side`, `opposite / (yes + no)`
pub fn implied_price(yes_reserves: u64, no_reserves: u64, side: Side) -> Result<f64, ModelError> {
    if yes_reserves == 0 || no_reserves == 0 {
        return Err(ModelError::InvalidReserves);
    }
    let total = yes_reserves as f64 + no_reserves as f64;
    let opposite = match side {
        Side::Yes => no_reserves,
        Side::No => yes_reserves,
    };
    Ok(opposite as f64 / total)
}
