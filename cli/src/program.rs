//! Solcasts program bindings: PDAs, instructions and the MarketState account
//!
//! The program is an Anchor program, so instruction data is an 8 byte
//! discriminator (`sha256("global:<name>")[..8]`) followed by borsh encoded
//! arguments, and accounts start with `sha256("account:<Type>")[..8]`.

use anyhow::{Context, Result};
use market_model::{cpmm, Side, Winner};
use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program, sysvar,
};

use crate::client::lamports_to_sol;
use crate::market::Market;

pub const SPL_TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

pub const MARKET_SEED: &[u8] = b"market";
pub const YES_MINT_SEED: &[u8] = b"yes";
pub const NO_MINT_SEED: &[u8] = b"no";

/// Derive the market PDA of a creator
pub fn derive_market_pda(program_id: &Pubkey, creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[MARKET_SEED, creator.as_ref()], program_id)
}

/// Derive the mint PDA of one outcome token
pub fn derive_mint_pda(program_id: &Pubkey, market: &Pubkey, side: Side) -> (Pubkey, u8) {
    let seed = match side {
        Side::Yes => YES_MINT_SEED,
        Side::No => NO_MINT_SEED,
    };
    Pubkey::find_program_address(&[seed, market.as_ref()], program_id)
}

/// Associated token account of `owner` for `mint`
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), SPL_TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = hash(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

fn put_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

/// `initialize_market(title, image)`, creating the market and both outcome mints
pub fn initialize_market_ix(program_id: &Pubkey, creator: &Pubkey, title: &str, image: &str) -> Instruction {
    let (market, _) = derive_market_pda(program_id, creator);
    let (yes_mint, _) = derive_mint_pda(program_id, &market, Side::Yes);
    let (no_mint, _) = derive_mint_pda(program_id, &market, Side::No);

    let mut data = Vec::with_capacity(8 + 8 + title.len() + image.len());
    data.extend_from_slice(&instruction_discriminator("initialize_market"));
    put_string(&mut data, title);
    put_string(&mut data, image);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(market, false),
            AccountMeta::new(yes_mint, false),
            AccountMeta::new(no_mint, false),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(SPL_TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data,
    }
}

/// `buy_yes(amount)` / `buy_no(amount)` with `amount` in lamports
///
/// The bought side lands in the buyer's associated token account; the minted
/// opposite side goes to the market's vault.
pub fn buy_ix(program_id: &Pubkey, market: &Pubkey, buyer: &Pubkey, side: Side, lamports: u64) -> Instruction {
    let (yes_mint, _) = derive_mint_pda(program_id, market, Side::Yes);
    let (no_mint, _) = derive_mint_pda(program_id, market, Side::No);

    let (name, user_account, market_vault) = match side {
        Side::Yes => (
            "buy_yes",
            associated_token_address(buyer, &yes_mint),
            associated_token_address(market, &no_mint),
        ),
        Side::No => (
            "buy_no",
            associated_token_address(buyer, &no_mint),
            associated_token_address(market, &yes_mint),
        ),
    };

    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&instruction_discriminator(name));
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*market, false),
            AccountMeta::new(yes_mint, false),
            AccountMeta::new(no_mint, false),
            AccountMeta::new(user_account, false),
            AccountMeta::new(market_vault, false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new_readonly(SPL_TOKEN_PROGRAM_ID, false),
        ],
        data,
    }
}

/// On-chain market account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub title: String,
    pub creator: Pubkey,
    pub yes_reserves: u64,
    pub no_reserves: u64,
    pub real_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub total_volume: u64,
    pub resolved: bool,
    pub winner: u8,
    pub bump: u8,
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .with_context(|| format!("account data truncated at byte {}", self.offset))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => anyhow::bail!("invalid bool byte {}", other),
        }
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(self.take(32)?);
        Ok(Pubkey::new_from_array(buf))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).context("title is not valid UTF-8")
    }
}

impl MarketState {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader { data, offset: 0 };
        if reader.take(8)? != account_discriminator("MarketState") {
            anyhow::bail!("account is not a MarketState");
        }

        let state = MarketState {
            title: reader.string()?,
            creator: reader.pubkey()?,
            yes_reserves: reader.u64()?,
            no_reserves: reader.u64()?,
            real_sol_reserves: reader.u64()?,
            real_token_reserves: reader.u64()?,
            total_volume: reader.u64()?,
            resolved: reader.bool()?,
            winner: reader.u8()?,
            bump: reader.u8()?,
        };
        if Winner::from_u8(state.winner).is_none() {
            anyhow::bail!("invalid winner code {}", state.winner);
        }
        Ok(state)
    }

    #[cfg(test)]
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(8 + 4 + self.title.len() + 32 + 5 * 8 + 3);
        data.extend_from_slice(&account_discriminator("MarketState"));
        put_string(&mut data, &self.title);
        data.extend_from_slice(self.creator.as_ref());
        for value in [
            self.yes_reserves,
            self.no_reserves,
            self.real_sol_reserves,
            self.real_token_reserves,
            self.total_volume,
        ] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.push(self.resolved as u8);
        data.push(self.winner);
        data.push(self.bump);
        data
    }

    /// Market view priced from the constant product reserves
    pub fn to_market(&self, address: &Pubkey) -> Result<Market> {
        let yes_price = cpmm::implied_price(self.yes_reserves, self.no_reserves, Side::Yes)
            .map_err(|e| anyhow::anyhow!("cannot price market {}: {}", address, e))?;

        Ok(Market {
            public_key: address.to_string(),
            title: self.title.clone(),
            image: String::new(),
            yes_price,
            no_price: 1.0 - yes_price,
            volume: lamports_to_sol(self.total_volume),
            liquidity: lamports_to_sol(self.real_sol_reserves),
            created_at: 0,
            creator: self.creator.to_string(),
            yes_reserves: self.yes_reserves,
            no_reserves: self.no_reserves,
            resolved: self.resolved,
            winner: Winner::from_u8(self.winner).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SOLCASTS_PROGRAM_ID;

    fn sample_state() -> MarketState {
        MarketState {
            title: "Will Bitcoin hit 100k by 2025?".to_string(),
            creator: Pubkey::new_unique(),
            yes_reserves: cpmm::INITIAL_VIRTUAL_RESERVES,
            no_reserves: cpmm::INITIAL_VIRTUAL_RESERVES,
            real_sol_reserves: 2_000_000_000,
            real_token_reserves: 0,
            total_volume: 3_500_000_000,
            resolved: false,
            winner: 0,
            bump: 254,
        }
    }

    #[test]
    fn test_anchor_discriminators() {
        assert_eq!(instruction_discriminator("initialize_market"), [35, 35, 189, 193, 155, 48, 170, 203]);
        assert_eq!(instruction_discriminator("buy_yes"), [124, 76, 113, 130, 177, 112, 187, 104]);
        assert_eq!(instruction_discriminator("buy_no"), [89, 240, 244, 16, 196, 201, 190, 163]);
        assert_eq!(account_discriminator("MarketState"), [0, 125, 123, 215, 95, 96, 164, 194]);
    }

    #[test]
    fn test_pdas_are_deterministic() {
        let creator = Pubkey::new_unique();
        let (market, bump) = derive_market_pda(&SOLCASTS_PROGRAM_ID, &creator);
        assert_eq!(derive_market_pda(&SOLCASTS_PROGRAM_ID, &creator), (market, bump));

        let (yes, _) = derive_mint_pda(&SOLCASTS_PROGRAM_ID, &market, Side::Yes);
        let (no, _) = derive_mint_pda(&SOLCASTS_PROGRAM_ID, &market, Side::No);
        assert_ne!(yes, no);
        assert!(!market.is_on_curve());
    }

    #[test]
    fn test_initialize_market_ix_layout() {
        let creator = Pubkey::new_unique();
        let ix = initialize_market_ix(&SOLCASTS_PROGRAM_ID, &creator, "abc", "");

        assert_eq!(&ix.data[..8], &instruction_discriminator("initialize_market"));
        assert_eq!(&ix.data[8..12], &3u32.to_le_bytes());
        assert_eq!(&ix.data[12..15], b"abc");
        assert_eq!(&ix.data[15..19], &0u32.to_le_bytes());
        assert_eq!(ix.data.len(), 19);

        assert_eq!(ix.accounts.len(), 7);
        assert!(ix.accounts[3].is_signer);
        assert_eq!(ix.accounts[3].pubkey, creator);
    }

    #[test]
    fn test_buy_ix_routes_tokens_by_side() {
        let market = Pubkey::new_unique();
        let buyer = Pubkey::new_unique();
        let (yes_mint, _) = derive_mint_pda(&SOLCASTS_PROGRAM_ID, &market, Side::Yes);
        let (no_mint, _) = derive_mint_pda(&SOLCASTS_PROGRAM_ID, &market, Side::No);

        let ix = buy_ix(&SOLCASTS_PROGRAM_ID, &market, &buyer, Side::No, 1_000_000_000);
        assert_eq!(&ix.data[..8], &instruction_discriminator("buy_no"));
        assert_eq!(&ix.data[8..], &1_000_000_000u64.to_le_bytes());
        assert_eq!(ix.accounts[3].pubkey, associated_token_address(&buyer, &no_mint));
        assert_eq!(ix.accounts[4].pubkey, associated_token_address(&market, &yes_mint));
    }

    #[test]
    fn test_market_state_decode() {
        let state = sample_state();
        let decoded = MarketState::decode(&state.encode()).unwrap();
        assert_eq!(decoded, state);

        let market = decoded.to_market(&Pubkey::new_unique()).unwrap();
        assert_eq!(market.yes_price, 0.5);
        assert_eq!(market.volume, 3.5);
        assert_eq!(market.liquidity, 2.0);
        assert_eq!(market.winner, Winner::Open);
    }

    #[test]
    fn test_market_state_rejects_bad_data() {
        let mut data = sample_state().encode();
        assert!(MarketState::decode(&data[..data.len() - 1]).is_err());

        data[0] ^= 0xff;
        assert!(MarketState::decode(&data).is_err());

        let mut state = sample_state();
        state.winner = 9;
        assert!(MarketState::decode(&state.encode()).is_err());
    }
}
