//! Redemption of outcome tokens after resolution
//!
//! A winning token redeems for one SOL, a losing token for nothing. Nothing
//! is redeemable while the market is open.

use crate::{Side, Winner};

/// SOL paid per winning outcome token
pub const PAYOUT_PER_TOKEN: f64 = 1.0;

/// Value in SOL of `tokens` of `side` once the market resolved to `winner`
pub fn redemption_value(winner: Winner, side: Side, tokens: f64) -> f64 {
    match winner.side() {
        Some(won) if won == side && tokens > 0.0 => tokens * PAYOUT_PER_TOKEN,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winning_side_pays() {
        assert_eq!(redemption_value(Winner::Yes, Side::Yes, 3.5), 3.5);
        assert_eq!(redemption_value(Winner::No, Side::No, 2.0), 2.0);
    }

    #[test]
    fn test_losing_and_open_pay_nothing() {
        assert_eq!(redemption_value(Winner::Yes, Side::No, 3.5), 0.0);
        assert_eq!(redemption_value(Winner::Open, Side::Yes, 3.5), 0.0);
        assert_eq!(redemption_value(Winner::No, Side::No, -1.0), 0.0);
    }
}
