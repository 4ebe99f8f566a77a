//! Errors raised by the simulated market store

use market_model::ModelError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("wallet not connected; run `connect` first")]
    NotConnected,

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("`{0}` matches more than one market; use a longer prefix")]
    AmbiguousMarket(String),

    #[error("market {0} is resolved; trading is closed")]
    MarketResolved(String),

    #[error("market {0} is already resolved")]
    AlreadyResolved(String),

    #[error("market {0} has not been resolved yet")]
    MarketOpen(String),

    #[error("winner must be YES or NO")]
    InvalidWinner,

    #[error("invalid amount: {0} (must be a positive number of SOL)")]
    InvalidAmount(f64),

    #[error("insufficient balance: requested {requested:.4} SOL, available {available:.4} SOL")]
    InsufficientBalance { requested: f64, available: f64 },

    #[error("invalid title: {0}")]
    InvalidTitle(&'static str),

    #[error("nothing to redeem in market {0}")]
    NothingToRedeem(String),

    #[error("pricing failed: {0}")]
    Pricing(ModelError),
}

impl From<ModelError> for StoreError {
    fn from(err: ModelError) -> Self {
        StoreError::Pricing(err)
    }
}
