//! In-memory market store standing in for on-chain state
//!
//! Holds every market plus the session's wallet balance, trades, positions
//! and profile. Each mutating call is validated up front, then waits out the
//! configured network latency, then applies. A call that fails leaves the
//! store exactly as it was.

use log::{debug, info};
use std::collections::BTreeMap;
use std::time::Duration;

use market_model::{apply_buy, preview, redemption_value, Preview, Side, Winner};

use crate::config::{LatencyConfig, SessionConfig};
use crate::error::StoreError;
use crate::market::{
    demo_markets, market_key, sort_markets, tx_reference, Market, MarketSort, Position, Trade,
    TradeKind, UserProfile, DEFAULT_IMAGE,
};
use crate::wallet::Wallet;

pub type StoreResult<T> = Result<T, StoreError>;

/// Longest title the program account can hold, in bytes
pub const MAX_TITLE_LEN: usize = 64;

/// Result of redeeming a resolved market
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub market: String,
    pub winner: Winner,
    pub payout: f64,
    pub cost: f64,
}

impl Redemption {
    pub fn pnl(&self) -> f64 {
        self.payout - self.cost
    }
}

pub struct MarketStore {
    /// Newest first
    markets: Vec<Market>,
    /// Newest first
    trades: Vec<Trade>,
    positions: BTreeMap<(String, Side), Position>,
    balance: f64,
    profile: UserProfile,
    wallet: Option<Wallet>,
    latency: LatencyConfig,
    seed_markets: bool,
    nonce: u64,
}

impl MarketStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            markets: Vec::new(),
            trades: Vec::new(),
            positions: BTreeMap::new(),
            balance: config.starting_balance,
            profile: config.profile.clone(),
            wallet: None,
            latency: config.latency,
            seed_markets: config.seed_markets,
            nonce: 0,
        }
    }

    pub fn connect_wallet(&mut self, wallet: Wallet) {
        info!("session wallet {}", wallet.address);
        self.wallet = Some(wallet);
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    fn require_wallet(&self) -> StoreResult<&Wallet> {
        self.wallet.as_ref().ok_or(StoreError::NotConnected)
    }

    async fn simulate(&self, op: &'static str, millis: u64) {
        if millis == 0 {
            return;
        }
        debug!("{}: simulating {}ms network latency", op, millis);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    /// All markets in the requested order, seeding the demo markets on first use
    pub async fn fetch_markets(&mut self, sort: MarketSort) -> Vec<Market> {
        self.simulate("fetch_markets", self.latency.fetch_ms).await;

        if self.markets.is_empty() && self.seed_markets {
            self.markets = demo_markets(now_millis());
            debug!("seeded {} demo markets", self.markets.len());
        }

        let mut markets = self.markets.clone();
        sort_markets(&mut markets, sort);
        markets
    }

    #[cfg(test)]
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn market(&self, key: &str) -> StoreResult<&Market> {
        self.markets
            .iter()
            .find(|m| m.public_key == key)
            .ok_or_else(|| StoreError::MarketNotFound(key.to_string()))
    }

    /// Look a market up by exact key or by a unique key prefix
    pub fn find_market(&self, query: &str) -> StoreResult<&Market> {
        if let Ok(market) = self.market(query) {
            return Ok(market);
        }

        let mut matches = self.markets.iter().filter(|m| m.public_key.starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(market), None) if !query.is_empty() => Ok(market),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousMarket(query.to_string())),
            _ => Err(StoreError::MarketNotFound(query.to_string())),
        }
    }

    fn market_index(&self, key: &str) -> StoreResult<usize> {
        self.markets
            .iter()
            .position(|m| m.public_key == key)
            .ok_or_else(|| StoreError::MarketNotFound(key.to_string()))
    }

    pub async fn create_market(&mut self, title: &str, image: &str) -> StoreResult<Market> {
        let creator = self.require_wallet()?.address.clone();

        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidTitle("title is empty"));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(StoreError::InvalidTitle("title is longer than 64 bytes"));
        }
        let image = match image.trim() {
            "" => DEFAULT_IMAGE,
            url => url,
        };

        self.simulate("create_market", self.latency.create_ms).await;

        let nonce = self.next_nonce();
        let market = Market::new(
            market_key(&creator, title, nonce),
            title.to_string(),
            image.to_string(),
            creator,
            now_millis(),
        );
        self.markets.insert(0, market.clone());

        info!("created market {} \"{}\"", market.public_key, market.title);
        Ok(market)
    }

    /// Buy `amount` SOL of `side` in market `key`
    pub async fn buy(&mut self, key: &str, side: Side, amount: f64) -> StoreResult<Trade> {
        self.require_wallet()?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(StoreError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        let index = self.market_index(key)?;
        let market = &self.markets[index];
        if market.resolved {
            return Err(StoreError::MarketResolved(key.to_string()));
        }
        let fill = apply_buy(&market.curve(), side, amount)?;

        self.simulate("buy", self.latency.buy_ms).await;

        self.markets[index].apply_fill(fill.state, amount);

        let nonce = self.next_nonce();
        let timestamp = now_millis();
        let trade = Trade {
            kind: TradeKind::from(side),
            market: key.to_string(),
            amount,
            price: fill.price,
            tokens_received: fill.tokens_out,
            timestamp,
            tx_hash: tx_reference(key, nonce, timestamp),
        };
        self.trades.insert(0, trade.clone());

        let position = self
            .positions
            .entry((key.to_string(), side))
            .or_insert_with(|| Position {
                market: key.to_string(),
                side,
                tokens: 0.0,
                cost: 0.0,
            });
        position.tokens += fill.tokens_out;
        position.cost += amount;

        self.balance -= amount;
        self.profile.total_volume += amount;

        info!(
            "bought {:.4} {} tokens in {} for {} SOL (price {:.4})",
            fill.tokens_out,
            side.as_str(),
            key,
            amount,
            fill.price
        );
        Ok(trade)
    }

    /// Preview a trade without touching state
    pub fn quote(&self, key: &str, side: Side, amount: f64) -> StoreResult<Preview> {
        let market = self.market(key)?;
        if market.resolved {
            return Err(StoreError::MarketResolved(key.to_string()));
        }
        Ok(preview(market.price(side), market.volume, amount)?)
    }

    pub async fn resolve_market(&mut self, key: &str, winner: Winner) -> StoreResult<Market> {
        self.require_wallet()?;
        if winner == Winner::Open {
            return Err(StoreError::InvalidWinner);
        }
        let index = self.market_index(key)?;
        if self.markets[index].resolved {
            return Err(StoreError::AlreadyResolved(key.to_string()));
        }

        self.simulate("resolve_market", self.latency.resolve_ms).await;

        let market = &mut self.markets[index];
        market.resolved = true;
        market.winner = winner;

        info!("resolved market {} as {:?}", key, winner);
        Ok(market.clone())
    }

    /// Pay out every position held in a resolved market
    pub async fn redeem(&mut self, key: &str) -> StoreResult<Redemption> {
        self.require_wallet()?;
        let market = self.market(key)?;
        if !market.resolved {
            return Err(StoreError::MarketOpen(key.to_string()));
        }
        let winner = market.winner;

        let held: Vec<(String, Side)> = self
            .positions
            .keys()
            .filter(|(market, _)| market == key)
            .cloned()
            .collect();
        if held.is_empty() {
            return Err(StoreError::NothingToRedeem(key.to_string()));
        }

        self.simulate("redeem", self.latency.transfer_ms).await;

        let mut payout = 0.0;
        let mut cost = 0.0;
        for id in held {
            if let Some(position) = self.positions.remove(&id) {
                payout += redemption_value(winner, position.side, position.tokens);
                cost += position.cost;
            }
        }

        self.balance += payout;
        self.profile.realized_pnl += payout - cost;

        info!("redeemed {} for {:.4} SOL", key, payout);
        Ok(Redemption {
            market: key.to_string(),
            winner,
            payout,
            cost,
        })
    }

    pub async fn deposit(&mut self, amount: f64) -> StoreResult<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        self.simulate("deposit", self.latency.transfer_ms).await;

        self.balance += amount;
        self.profile.total_deposited += amount;
        info!("deposited {} SOL", amount);
        Ok(self.balance)
    }

    pub async fn withdraw(&mut self, amount: f64) -> StoreResult<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(StoreError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        self.simulate("withdraw", self.latency.transfer_ms).await;

        self.balance -= amount;
        self.profile.total_withdrawn += amount;
        info!("withdrew {} SOL", amount);
        Ok(self.balance)
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Profile with unrealized PnL marked to current prices
    pub fn profile(&self) -> UserProfile {
        let mut profile = self.profile.clone();
        for position in self.positions.values() {
            let value = match self.market(&position.market) {
                Ok(market) if market.resolved => {
                    redemption_value(market.winner, position.side, position.tokens)
                }
                Ok(market) => position.tokens * market.price(position.side),
                Err(_) => 0.0,
            };
            profile.unrealized_pnl += value - position.cost;
        }
        profile
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BTC: &str = "So11111111111111111111111111111111111111112";
    const EPS: f64 = 1e-9;

    fn session() -> SessionConfig {
        SessionConfig::default().without_latency()
    }

    async fn connected_store() -> MarketStore {
        let mut store = MarketStore::new(&session());
        store.connect_wallet(Wallet::demo());
        store.fetch_markets(MarketSort::Trending).await;
        store
    }

    #[tokio::test]
    async fn test_fetch_seeds_demo_markets_once() {
        let mut store = MarketStore::new(&session());
        let markets = store.fetch_markets(MarketSort::Trending).await;

        assert_eq!(markets.len(), 3);
        assert_eq!(markets[0].volume, 5402.1);

        let again = store.fetch_markets(MarketSort::New).await;
        assert_eq!(again.len(), 3);
        assert_eq!(again[0].public_key, "So11111111111111111111111111111111111111112");
    }

    #[tokio::test]
    async fn test_fetch_without_seeding() {
        let config = SessionConfig {
            seed_markets: false,
            ..session()
        };
        let mut store = MarketStore::new(&config);
        assert!(store.fetch_markets(MarketSort::Trending).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_wallet() {
        let mut store = MarketStore::new(&session());
        assert_eq!(
            store.create_market("Will it rain?", "").await,
            Err(StoreError::NotConnected)
        );
        assert!(store.markets().is_empty());
    }

    #[tokio::test]
    async fn test_create_market_defaults() {
        let mut store = connected_store().await;
        let market = store.create_market("  Will it rain?  ", "").await.unwrap();

        assert_eq!(market.title, "Will it rain?");
        assert_eq!(market.image, DEFAULT_IMAGE);
        assert_eq!(market.creator, crate::wallet::DEMO_WALLET);
        assert_eq!(market.yes_price, 0.5);
        assert_eq!(market.liquidity, 1.0);
        assert_eq!(market.yes_reserves, 1_000_000_000);
        assert!(!market.resolved);

        let newest = store.fetch_markets(MarketSort::New).await;
        assert_eq!(newest[0].public_key, market.public_key);
        assert_eq!(newest.len(), 4);
    }

    #[tokio::test]
    async fn test_create_market_rejects_bad_titles() {
        let mut store = connected_store().await;
        assert!(matches!(
            store.create_market("   ", "").await,
            Err(StoreError::InvalidTitle(_))
        ));
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            store.create_market(&long, "").await,
            Err(StoreError::InvalidTitle(_))
        ));
        assert_eq!(store.markets().len(), 3);
    }

    #[tokio::test]
    async fn test_buy_updates_market_balance_and_history() {
        let mut store = connected_store().await;
        let trade = store.buy(BTC, Side::Yes, 2.0).await.unwrap();

        assert_eq!(trade.kind, TradeKind::BuyYes);
        assert!((trade.price - 0.69).abs() < EPS);
        assert!((trade.tokens_received - 2.0 / 0.69).abs() < EPS);

        let market = store.market(BTC).unwrap();
        assert!((market.yes_price - 0.69).abs() < EPS);
        assert!((market.yes_price + market.no_price - 1.0).abs() < EPS);
        assert_eq!(market.yes_reserves, 850_000_000 - 2000);
        assert_eq!(market.no_reserves, 1_150_000_000 + 2000);
        assert!((market.volume - 1247.5).abs() < EPS);
        assert!((market.liquidity - 842.2).abs() < EPS);

        assert!((store.balance() - 12.2).abs() < EPS);
        assert_eq!(store.trades().len(), 1);
        assert!((store.profile().total_volume - 47.5).abs() < EPS);
        assert_eq!(store.positions().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_buys_leave_store_unchanged() {
        let mut store = connected_store().await;
        let before = store.market(BTC).unwrap().clone();

        assert!(matches!(
            store.buy(BTC, Side::No, 100.0).await,
            Err(StoreError::InsufficientBalance { .. })
        ));
        assert_eq!(store.buy(BTC, Side::No, 0.0).await, Err(StoreError::InvalidAmount(0.0)));
        assert!(matches!(
            store.buy("nope", Side::No, 1.0).await,
            Err(StoreError::MarketNotFound(_))
        ));

        assert_eq!(store.market(BTC).unwrap(), &before);
        assert!(store.trades().is_empty());
        assert_eq!(store.balance(), 14.2);
    }

    #[tokio::test]
    async fn test_buy_requires_wallet() {
        let mut store = MarketStore::new(&session());
        store.fetch_markets(MarketSort::Trending).await;
        assert_eq!(store.buy(BTC, Side::Yes, 1.0).await, Err(StoreError::NotConnected));
    }

    #[tokio::test]
    async fn test_resolve_rules() {
        let mut store = connected_store().await;

        assert_eq!(
            store.resolve_market(BTC, Winner::Open).await,
            Err(StoreError::InvalidWinner)
        );
        let market = store.resolve_market(BTC, Winner::No).await.unwrap();
        assert!(market.resolved);
        assert_eq!(market.winner, Winner::No);

        assert_eq!(
            store.resolve_market(BTC, Winner::Yes).await,
            Err(StoreError::AlreadyResolved(BTC.to_string()))
        );
        assert_eq!(
            store.buy(BTC, Side::Yes, 1.0).await,
            Err(StoreError::MarketResolved(BTC.to_string()))
        );
    }

    #[tokio::test]
    async fn test_redeem_winning_position() {
        let mut store = connected_store().await;
        let market = store.create_market("Coin flip", "").await.unwrap();
        let key = market.public_key.as_str();

        let trade = store.buy(key, Side::Yes, 1.0).await.unwrap();
        assert_eq!(store.redeem(key).await, Err(StoreError::MarketOpen(key.to_string())));

        store.resolve_market(key, Winner::Yes).await.unwrap();
        let redemption = store.redeem(key).await.unwrap();

        assert!((redemption.payout - trade.tokens_received).abs() < EPS);
        assert!((redemption.pnl() - (trade.tokens_received - 1.0)).abs() < EPS);
        assert!((store.balance() - (14.2 - 1.0 + trade.tokens_received)).abs() < EPS);
        assert!((store.profile().realized_pnl - (3.4 + redemption.pnl())).abs() < EPS);

        assert_eq!(store.positions().count(), 0);
        assert_eq!(store.redeem(key).await, Err(StoreError::NothingToRedeem(key.to_string())));
    }

    #[tokio::test]
    async fn test_redeem_losing_position_realizes_loss() {
        let mut store = connected_store().await;
        store.buy(BTC, Side::No, 3.0).await.unwrap();
        store.resolve_market(BTC, Winner::Yes).await.unwrap();

        let redemption = store.redeem(BTC).await.unwrap();
        assert_eq!(redemption.payout, 0.0);
        assert!((redemption.pnl() + 3.0).abs() < EPS);
        assert!((store.profile().realized_pnl - 0.4).abs() < EPS);
    }

    #[tokio::test]
    async fn test_unrealized_pnl_marks_to_market() {
        let mut store = connected_store().await;
        let trade = store.buy(BTC, Side::Yes, 1.0).await.unwrap();

        // Marked at the post-trade price, the position is worth exactly its cost
        let expected = 1.2 + trade.tokens_received * trade.price - 1.0;
        assert!((store.profile().unrealized_pnl - expected).abs() < EPS);
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw() {
        let mut store = MarketStore::new(&session());

        assert!((store.deposit(0.8).await.unwrap() - 15.0).abs() < EPS);
        assert!((store.withdraw(5.0).await.unwrap() - 10.0).abs() < EPS);
        assert!(matches!(
            store.withdraw(10.5).await,
            Err(StoreError::InsufficientBalance { .. })
        ));
        assert_eq!(store.deposit(-1.0).await, Err(StoreError::InvalidAmount(-1.0)));

        let profile = store.profile();
        assert!((profile.total_deposited - 20.8).abs() < EPS);
        assert!((profile.total_withdrawn - 5.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_find_market_by_prefix() {
        let mut store = connected_store().await;

        assert_eq!(store.find_market(BTC).unwrap().public_key, BTC);
        assert!(matches!(
            store.find_market("So111"),
            Err(StoreError::AmbiguousMarket(_))
        ));
        assert!(matches!(store.find_market(""), Err(StoreError::AmbiguousMarket(_))));

        let created = store.create_market("Prefix lookup", "").await.unwrap();
        let prefix = &created.public_key[..created.public_key.len() - 4];
        assert!(!prefix.starts_with("So111"));
        assert_eq!(store.find_market(prefix).unwrap().public_key, created.public_key);
    }

    #[tokio::test]
    async fn test_quote_does_not_mutate() {
        let store = connected_store().await;
        let quote = store.quote(BTC, Side::No, 3.5).unwrap();

        assert!((quote.potential_return - 10.0).abs() < EPS);
        assert!((quote.payout_multiplier - 1.0 / 0.35).abs() < EPS);
        assert_eq!(store.market(BTC).unwrap().no_price, 0.35);
    }
}
