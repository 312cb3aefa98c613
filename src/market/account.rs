//! Market and market state accounts
//!
//! The market account ties a market's mints and vaults to its order book
//! account (`orders`) and the first settlement log (`settle0`). The market
//! state account tracks the live ends of the settlement log chain and the
//! running balances.

use crate::address::Address;
use crate::error::{Error, Result};
use crate::slab::ByteReader;
use serde::Serialize;

/// Leading 8 bytes identifying a market account
pub const MARKET_DISCRIMINATOR: [u8; 8] = [0xdb, 0xbe, 0xd5, 0x37, 0x00, 0xe3, 0xc6, 0x9a];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketAccount {
    pub active: bool,
    pub manager_actions: bool,
    pub expire_enable: bool,
    pub expire_min: i64,
    pub min_quantity: u64,
    pub tick_decimals: u8,
    pub log_fee: u64,
    pub log_rebate: u64,
    pub log_reimburse: u64,
    pub taker_fee: u32,
    pub maker_rebate: u32,
    pub state: Address,
    pub trade_log: Address,
    pub agent: Address,
    pub agent_nonce: u8,
    pub manager: Address,
    pub mkt_mint: Address,
    pub mkt_vault: Address,
    pub mkt_decimals: u8,
    pub mkt_mint_type: u8,
    pub prc_mint: Address,
    pub prc_vault: Address,
    pub prc_decimals: u8,
    pub prc_mint_type: u8,
    /// Order book account
    pub orders: Address,
    /// First settlement log account
    pub settle0: Address,
}

/// Leading 8 bytes identifying a market state account
pub const MARKET_STATE_DISCRIMINATOR: [u8; 8] = [0x00, 0x7d, 0x7b, 0xd7, 0x5f, 0x60, 0xa4, 0xc2];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketState {
    /// Settlement log currently accepting entries
    pub settle_a: Address,
    /// Settlement log the chain rolls over into
    pub settle_b: Address,
    pub log_rollover: bool,
    pub log_deposit_balance: u64,
    pub action_counter: u64,
    pub order_counter: u64,
    /// Resting bids, comparable with the bid tree's leaf count
    pub active_bid: u32,
    pub active_ask: u32,
    pub mkt_vault_balance: u64,
    pub mkt_order_balance: u64,
    pub mkt_user_vault_balance: u64,
    pub mkt_log_balance: u64,
    pub prc_vault_balance: u64,
    pub prc_order_balance: u64,
    pub prc_user_vault_balance: u64,
    pub prc_log_balance: u64,
    pub prc_fees_balance: u64,
    pub last_ts: i64,
    pub last_price: u64,
}

fn read_address(reader: &mut ByteReader<'_>) -> Result<Address> {
    Ok(Address::new(reader.read_array()?))
}

impl MarketAccount {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        if reader.read_array::<8>()? != MARKET_DISCRIMINATOR {
            return Err(Error::InvalidDiscriminator);
        }
        let r = &mut reader;

        Ok(Self {
            active: r.read_bool()?,
            manager_actions: r.read_bool()?,
            expire_enable: r.read_bool()?,
            expire_min: r.read_i64()?,
            min_quantity: r.read_u64()?,
            tick_decimals: r.read_u8()?,
            log_fee: r.read_u64()?,
            log_rebate: r.read_u64()?,
            log_reimburse: r.read_u64()?,
            taker_fee: r.read_u32()?,
            maker_rebate: r.read_u32()?,
            state: read_address(r)?,
            trade_log: read_address(r)?,
            agent: read_address(r)?,
            agent_nonce: r.read_u8()?,
            manager: read_address(r)?,
            mkt_mint: read_address(r)?,
            mkt_vault: read_address(r)?,
            mkt_decimals: r.read_u8()?,
            mkt_mint_type: r.read_u8()?,
            prc_mint: read_address(r)?,
            prc_vault: read_address(r)?,
            prc_decimals: r.read_u8()?,
            prc_mint_type: r.read_u8()?,
            orders: read_address(r)?,
            settle0: read_address(r)?,
        })
    }
}

impl MarketState {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        if reader.read_array::<8>()? != MARKET_STATE_DISCRIMINATOR {
            return Err(Error::InvalidDiscriminator);
        }
        let r = &mut reader;

        Ok(Self {
            settle_a: read_address(r)?,
            settle_b: read_address(r)?,
            log_rollover: r.read_bool()?,
            log_deposit_balance: r.read_u64()?,
            action_counter: r.read_u64()?,
            order_counter: r.read_u64()?,
            active_bid: r.read_u32()?,
            active_ask: r.read_u32()?,
            mkt_vault_balance: r.read_u64()?,
            mkt_order_balance: r.read_u64()?,
            mkt_user_vault_balance: r.read_u64()?,
            mkt_log_balance: r.read_u64()?,
            prc_vault_balance: r.read_u64()?,
            prc_order_balance: r.read_u64()?,
            prc_user_vault_balance: r.read_u64()?,
            prc_log_balance: r.read_u64()?,
            prc_fees_balance: r.read_u64()?,
            last_ts: r.read_i64()?,
            last_price: r.read_u64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_bytes() -> Vec<u8> {
        let mut data = MARKET_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&[1, 0, 1]);
        data.extend_from_slice(&(-60i64).to_le_bytes());
        data.extend_from_slice(&100u64.to_le_bytes());
        data.push(2);
        data.extend_from_slice(&5u64.to_le_bytes());
        data.extend_from_slice(&6u64.to_le_bytes());
        data.extend_from_slice(&7u64.to_le_bytes());
        data.extend_from_slice(&25u32.to_le_bytes());
        data.extend_from_slice(&10u32.to_le_bytes());
        for fill in 1..=3u8 {
            data.extend_from_slice(&[fill; 32]);
        }
        data.push(254);
        for fill in 4..=6u8 {
            data.extend_from_slice(&[fill; 32]);
        }
        data.extend_from_slice(&[9, 0]);
        for fill in 7..=8u8 {
            data.extend_from_slice(&[fill; 32]);
        }
        data.extend_from_slice(&[6, 1]);
        for fill in 9..=10u8 {
            data.extend_from_slice(&[fill; 32]);
        }
        data
    }

    #[test]
    fn test_decode_market() -> Result<()> {
        let market = MarketAccount::decode(&market_bytes())?;

        assert!(market.active);
        assert!(!market.manager_actions);
        assert_eq!(market.expire_min, -60);
        assert_eq!(market.tick_decimals, 2);
        assert_eq!(market.taker_fee, 25);
        assert_eq!(market.agent_nonce, 254);
        assert_eq!(market.mkt_decimals, 9);
        assert_eq!(market.prc_mint_type, 1);
        assert_eq!(market.orders, Address::new([9; 32]));
        assert_eq!(market.settle0, Address::new([10; 32]));
        Ok(())
    }

    #[test]
    fn test_wrong_discriminator() {
        let mut data = market_bytes();
        data[0] ^= 1;
        assert_eq!(MarketAccount::decode(&data), Err(Error::InvalidDiscriminator));
    }

    #[test]
    fn test_truncated_market() {
        let data = market_bytes();
        assert!(matches!(
            MarketAccount::decode(&data[..data.len() - 1]),
            Err(Error::TruncatedRecord { .. })
        ));
    }

    fn market_state_bytes() -> Vec<u8> {
        let mut data = MARKET_STATE_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&[0x5a; 32]);
        data.extend_from_slice(&[0x5b; 32]);
        data.push(1);
        for value in 1..=3u64 {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        for value in 10..=18u64 {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&1_650_000_000i64.to_le_bytes());
        data.extend_from_slice(&1234u64.to_le_bytes());
        data
    }

    #[test]
    fn test_decode_market_state() -> Result<()> {
        let state = MarketState::decode(&market_state_bytes())?;

        assert_eq!(state.settle_a, Address::new([0x5a; 32]));
        assert_eq!(state.settle_b, Address::new([0x5b; 32]));
        assert!(state.log_rollover);
        assert_eq!(state.order_counter, 3);
        assert_eq!(state.active_bid, 4);
        assert_eq!(state.active_ask, 5);
        assert_eq!(state.mkt_vault_balance, 10);
        assert_eq!(state.prc_fees_balance, 18);
        assert_eq!(state.last_ts, 1_650_000_000);
        assert_eq!(state.last_price, 1234);
        Ok(())
    }

    #[test]
    fn test_market_state_discriminators_differ() {
        // Neither account decodes as the other
        assert_eq!(
            MarketState::decode(&market_bytes()),
            Err(Error::InvalidDiscriminator)
        );
        assert_eq!(
            MarketAccount::decode(&market_state_bytes()),
            Err(Error::InvalidDiscriminator)
        );
    }

    #[test]
    fn test_truncated_market_state() {
        let data = market_state_bytes();
        assert!(matches!(
            MarketState::decode(&data[..data.len() - 8]),
            Err(Error::TruncatedRecord { .. })
        ));
    }
}
