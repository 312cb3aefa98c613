// orderslab - Paged slab decoder
// Reads order books and settlement logs out of fixed-size account blobs

#![warn(rust_2018_idioms)]

pub mod address;
pub mod codec;
pub mod config;
pub mod market;
pub mod slab;

// Re-exports for convenience
pub use address::Address;
pub use codec::order_id;
pub use config::DecoderConfig;
pub use market::{
    LogSource, MarketAccount, MarketState, OrderBook, OrderRecord, SettlementChain,
    SettlementEntry, SettlementLog, Side,
};
pub use slab::{CollectionHeader, PagePool, SlabTree, SlotVector, TreeNode};

/// Decoder error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        #[error("Malformed layout: {0}")]
        MalformedLayout(String),

        #[error("Invalid node tag {tag} at node index {index}")]
        InvalidNodeTag { tag: u32, index: usize },

        #[error("Truncated record: needed {needed} bytes, {remaining} remaining")]
        TruncatedRecord { needed: usize, remaining: usize },

        #[error("Invalid key encoding: {0}")]
        InvalidKeyEncoding(String),

        #[error("Invalid address: {0}")]
        InvalidAddress(String),

        #[error("Account discriminator does not match")]
        InvalidDiscriminator,

        #[error("Log source error: {0}")]
        Source(String),

        #[error("Configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::error::Error;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidNodeTag { tag: 5, index: 3 };
        assert_eq!(err.to_string(), "Invalid node tag 5 at node index 3");

        let err = Error::TruncatedRecord {
            needed: 56,
            remaining: 12,
        };
        assert!(err.to_string().contains("needed 56 bytes"));
    }
}
