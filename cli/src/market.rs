//! Market, trade and profile records shown to the user

use clap::ValueEnum;
use market_model::{CurveState, Side, Winner};
use serde::{Deserialize, Serialize, Serializer};
use solana_sdk::hash::hashv;

/// Image used when a market is created without one
pub const DEFAULT_IMAGE: &str = "https://picsum.photos/400/400";

/// Initial SOL liquidity credited to a new market
pub const INITIAL_LIQUIDITY: f64 = 1.0;

/// Initial token reserves of each side of a new market
pub const INITIAL_RESERVES: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub public_key: String,
    pub title: String,
    pub image: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: f64,
    pub liquidity: f64,
    pub created_at: i64,
    pub creator: String,
    pub yes_reserves: u64,
    pub no_reserves: u64,
    pub resolved: bool,
    #[serde(serialize_with = "serialize_winner")]
    pub winner: Winner,
}

impl Market {
    pub fn new(public_key: String, title: String, image: String, creator: String, created_at: i64) -> Self {
        Self {
            public_key,
            title,
            image,
            yes_price: 0.5,
            no_price: 0.5,
            volume: 0.0,
            liquidity: INITIAL_LIQUIDITY,
            created_at,
            creator,
            yes_reserves: INITIAL_RESERVES,
            no_reserves: INITIAL_RESERVES,
            resolved: false,
            winner: Winner::Open,
        }
    }

    pub fn curve(&self) -> CurveState {
        CurveState {
            yes_price: self.yes_price,
            no_price: self.no_price,
            yes_reserves: self.yes_reserves,
            no_reserves: self.no_reserves,
        }
    }

    pub fn price(&self, side: Side) -> f64 {
        self.curve().price(side)
    }

    /// Take on the curve state after a fill of `amount` SOL
    pub fn apply_fill(&mut self, state: CurveState, amount: f64) {
        self.yes_price = state.yes_price;
        self.no_price = state.no_price;
        self.yes_reserves = state.yes_reserves;
        self.no_reserves = state.no_reserves;
        self.volume += amount;
        self.liquidity += amount;
    }
}

fn serialize_winner<S: Serializer>(winner: &Winner, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(winner.as_u8())
}

fn serialize_side<S: Serializer>(side: &Side, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(side.as_str())
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MarketSort {
    /// Highest volume first
    #[default]
    Trending,
    /// Newest first
    New,
}

pub fn sort_markets(markets: &mut [Market], sort: MarketSort) {
    match sort {
        MarketSort::Trending => markets.sort_by(|a, b| b.volume.total_cmp(&a.volume)),
        MarketSort::New => markets.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    BuyYes,
    BuyNo,
}

impl From<Side> for TradeKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Yes => TradeKind::BuyYes,
            Side::No => TradeKind::BuyNo,
        }
    }
}

impl TradeKind {
    pub fn side(self) -> Side {
        match self {
            TradeKind::BuyYes => Side::Yes,
            TradeKind::BuyNo => Side::No,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub market: String,
    pub amount: f64,
    pub price: f64,
    pub tokens_received: f64,
    pub timestamp: i64,
    pub tx_hash: String,
}

/// Outcome tokens held in one side of one market
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub market: String,
    #[serde(serialize_with = "serialize_side")]
    pub side: Side,
    pub tokens: f64,
    /// SOL spent acquiring `tokens`
    pub cost: f64,
}

/// Session profile; unset fields in a config file keep the demo session values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct UserProfile {
    pub total_deposited: f64,
    pub total_withdrawn: f64,
    /// Closed positions
    pub realized_pnl: f64,
    /// Open positions
    pub unrealized_pnl: f64,
    pub total_volume: f64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            total_deposited: 20.0,
            total_withdrawn: 0.0,
            realized_pnl: 3.4,
            unrealized_pnl: 1.2,
            total_volume: 45.5,
        }
    }
}

/// Base58 key for a market created in the simulated store
pub fn market_key(creator: &str, title: &str, nonce: u64) -> String {
    let hash = hashv(&[b"market", creator.as_bytes(), title.as_bytes(), &nonce.to_le_bytes()]);
    bs58::encode(hash.to_bytes()).into_string()
}

/// Signature-shaped (64 byte) base58 reference for a simulated trade
pub fn tx_reference(market: &str, nonce: u64, timestamp: i64) -> String {
    let head = hashv(&[b"tx", market.as_bytes(), &nonce.to_le_bytes()]);
    let tail = hashv(&[head.as_ref(), &timestamp.to_le_bytes()]);

    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(head.as_ref());
    bytes.extend_from_slice(tail.as_ref());
    bs58::encode(bytes).into_string()
}

/// The markets a fresh session starts with
pub fn demo_markets(now: i64) -> Vec<Market> {
    vec![
        Market {
            public_key: "So11111111111111111111111111111111111111112".to_string(),
            title: "Will Bitcoin hit $100k in 2024?".to_string(),
            image: "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?auto=format&fit=crop&w=400&q=80".to_string(),
            yes_price: 0.65,
            no_price: 0.35,
            volume: 1245.5,
            liquidity: 840.2,
            created_at: now,
            creator: "845s...12z".to_string(),
            yes_reserves: 850_000_000,
            no_reserves: 1_150_000_000,
            resolved: false,
            winner: Winner::Open,
        },
        Market {
            public_key: "So11111111111111111111111111111111111111113".to_string(),
            title: "Will Solana flip Ethereum market cap by Q3?".to_string(),
            image: "https://images.unsplash.com/photo-1620321023374-d1a68fddadb3?auto=format&fit=crop&w=400&q=80".to_string(),
            yes_price: 0.12,
            no_price: 0.88,
            volume: 5402.1,
            liquidity: 2310.5,
            created_at: now - 100_000,
            creator: "999s...aa1".to_string(),
            yes_reserves: 1_800_000_000,
            no_reserves: 200_000_000,
            resolved: false,
            winner: Winner::Open,
        },
        Market {
            public_key: "So11111111111111111111111111111111111111114".to_string(),
            title: "Will GPT-5 be released before December?".to_string(),
            image: "https://images.unsplash.com/photo-1677442136019-21780ecad995?auto=format&fit=crop&w=400&q=80".to_string(),
            yes_price: 0.5,
            no_price: 0.5,
            volume: 12.0,
            liquidity: 12.0,
            created_at: now - 20_000,
            creator: "777s...bb2".to_string(),
            yes_reserves: INITIAL_RESERVES,
            no_reserves: INITIAL_RESERVES,
            resolved: false,
            winner: Winner::Open,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_orders() {
        let mut markets = demo_markets(1_000_000);

        sort_markets(&mut markets, MarketSort::Trending);
        let volumes: Vec<f64> = markets.iter().map(|m| m.volume).collect();
        assert_eq!(volumes, vec![5402.1, 1245.5, 12.0]);

        sort_markets(&mut markets, MarketSort::New);
        let created: Vec<i64> = markets.iter().map(|m| m.created_at).collect();
        assert_eq!(created, vec![1_000_000, 980_000, 900_000]);
    }

    #[test]
    fn test_demo_markets_prices_sum_to_one() {
        for market in demo_markets(0) {
            assert!((market.yes_price + market.no_price - 1.0).abs() < 1e-12, "{}", market.title);
        }
    }

    #[test]
    fn test_keys_are_deterministic_and_distinct() {
        let a = market_key("creator", "title", 1);
        assert_eq!(a, market_key("creator", "title", 1));
        assert_ne!(a, market_key("creator", "title", 2));
        assert_eq!(bs58::decode(&a).into_vec().unwrap().len(), 32);

        let tx = tx_reference(&a, 7, 42);
        assert_eq!(bs58::decode(&tx).into_vec().unwrap().len(), 64);
    }

    #[test]
    fn test_market_json_shape() {
        let market = Market::new("key".into(), "t".into(), DEFAULT_IMAGE.into(), "me".into(), 5);
        let json = serde_json::to_value(&market).unwrap();
        assert_eq!(json["publicKey"], "key");
        assert_eq!(json["winner"], 0);
        assert_eq!(json["yesReserves"], 1_000_000_000u64);

        let trade = Trade {
            kind: TradeKind::BuyNo,
            market: "key".into(),
            amount: 1.0,
            price: 0.52,
            tokens_received: 1.0 / 0.52,
            timestamp: 5,
            tx_hash: "x".into(),
        };
        assert_eq!(serde_json::to_value(&trade).unwrap()["type"], "BUY_NO");
    }
}
