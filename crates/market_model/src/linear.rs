//! Linear impact curve used by the simulated market store
//!
//! Every SOL spent on a side moves that side's price up by a fixed
//! [`IMPACT_PER_SOL`], capped at [`PRICE_CAP`]. The opposite side is always
//! `1 - price`, so the pair sums to one after every trade.
//!
//! Reserves move by [`RESERVE_UNITS_PER_SOL`] per SOL in opposing directions:
//! the bought side is drained, the other side grows.

use crate::{ModelError, Side};

/// Price increase per SOL traded
pub const IMPACT_PER_SOL: f64 = 0.02;

/// Highest price a side can be pushed to
pub const PRICE_CAP: f64 = 0.99;

/// Reserve units moved per SOL traded
pub const RESERVE_UNITS_PER_SOL: f64 = 1000.0;

/// Prices and reserves of one market
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveState {
    pub yes_price: f64,
    pub no_price: f64,
    pub yes_reserves: u64,
    pub no_reserves: u64,
}

impl CurveState {
    pub fn price(&self, side: Side) -> f64 {
        match side {
            Side::Yes => self.yes_price,
            Side::No => self.no_price,
        }
    }

    pub fn reserves(&self, side: Side) -> u64 {
        match side {
            Side::Yes => self.yes_reserves,
            Side::No => self.no_reserves,
        }
    }
}

/// Outcome of a buy against the curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Curve after the trade
    pub state: CurveState,
    /// New price of the side bought
    pub price: f64,
    /// Outcome tokens received (`amount / price`)
    pub tokens_out: f64,
}

/// Buy `amount` SOL of `side`
///
/// # Errors
/// * `InvalidAmount` - amount negative or not finite
/// * `InvalidPrice` - current price of `side` outside [0, 1], or zero after
///   the trade (no finite token amount)
/// * `ReserveDepleted` - bought side's reserve would drop below zero
/// * `Overflow` - opposite reserve would exceed `u64::MAX`
pub fn apply_buy(state: &CurveState, side: Side, amount: f64) -> Result<Fill, ModelError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ModelError::InvalidAmount);
    }
    let old_price = state.price(side);
    if !is_valid_price(old_price) {
        return Err(ModelError::InvalidPrice);
    }

    let impact = amount * IMPACT_PER_SOL;
    let price = PRICE_CAP.min(old_price + impact);
    if amount > 0.0 && price == 0.0 {
        return Err(ModelError::InvalidPrice);
    }
    let opposite_price = 1.0 - price;

    let delta = reserve_delta(amount)?;
    let drained = state
        .reserves(side)
        .checked_sub(delta)
        .ok_or(ModelError::ReserveDepleted)?;
    let grown = state
        .reserves(side.opposite())
        .checked_add(delta)
        .ok_or(ModelError::Overflow)?;

    let next = match side {
        Side::Yes => CurveState {
            yes_price: price,
            no_price: opposite_price,
            yes_reserves: drained,
            no_reserves: grown,
        },
        Side::No => CurveState {
            yes_price: opposite_price,
            no_price: price,
            yes_reserves: grown,
            no_reserves: drained,
        },
    };

    let tokens_out = if amount == 0.0 { 0.0 } else { amount / price };

    Ok(Fill {
        state: next,
        price,
        tokens_out,
    })
}

/// What a prospective trade would return if the price did not move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    /// Payout in SOL if the side wins (`amount / price`)
    pub potential_return: f64,
    /// Payout per SOL staked (`1 / price`)
    pub payout_multiplier: f64,
    /// Share of traded volume this trade represents, in percent, capped at 100
    pub liquidity_share_pct: f64,
}

/// Preview a trade of `amount` SOL at `price` in a market with `volume`
pub fn preview(price: f64, volume: f64, amount: f64) -> Result<Preview, ModelError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ModelError::InvalidAmount);
    }
    if !is_valid_price(price) || price == 0.0 {
        return Err(ModelError::InvalidPrice);
    }
    if !volume.is_finite() || volume < 0.0 {
        return Err(ModelError::InvalidAmount);
    }

    Ok(Preview {
        potential_return: amount / price,
        payout_multiplier: 1.0 / price,
        liquidity_share_pct: (amount / (volume + 1.0) * 100.0).min(100.0),
    })
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && (0.0..=1.0).contains(&price)
}

// Rounds half up; amount is already known to be finite and non-negative.
fn reserve_delta(amount: f64) -> Result<u64, ModelError> {
    let units = amount * RESERVE_UNITS_PER_SOL + 0.5;
    if units >= u64::MAX as f64 {
        return Err(ModelError::Overflow);
    }
    Ok(units as u64)
}
