//! Market accounts built on slab collections
//!
//! - [`OrderBook`]: bid and ask trees joined with their order slots
//! - [`SettlementLog`]: one account of the settlement log chain
//! - [`SettlementChain`]: lazy walk across settlement log accounts
//! - [`MarketAccount`]: market metadata naming the accounts above
//! - [`MarketState`]: live settlement chain ends and running balances

pub mod account;
pub mod orderbook;
pub mod settlement;

pub use account::{
    MarketAccount, MarketState, MARKET_DISCRIMINATOR, MARKET_STATE_DISCRIMINATOR,
};
pub use orderbook::{OrderBook, OrderBookSlab, OrderRecord, Side, BOOK_HEADER_COUNT};
pub use settlement::{
    LogSource, SettlementChain, SettlementEntry, SettlementLog, SettlementLogSlab,
    LOG_PREAMBLE_SIZE,
};
