//! Settlement log accounts
//!
//! Settlement logs form a doubly linked list of accounts. Each holds one
//! tree (owner → slot) and one vector of balances.
//!
//! ```text
//! [market 32B][prev 32B][next 32B][u32][u16][header table][6 pages]
//! ```
//!
//! The all-zero address in `prev` or `next` marks the end of the list.

use crate::address::Address;
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::slab::{ByteReader, CollectionHeader, PagePool, SettlementSlot, SlabTree, SlotVector};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Bytes before the header table
pub const LOG_PREAMBLE_SIZE: usize = 32 * 3 + 4 + 2;

/// One owner's settled balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementEntry {
    pub owner: Address,
    pub mkt_balance: u64,
    pub prc_balance: u64,
    pub updated_at: i64,
}

/// A settlement log account as raw collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementLogSlab {
    pub market: Address,
    pub prev: Address,
    pub next: Address,
    pub headers: Vec<CollectionHeader>,
    pub tree: SlabTree,
    pub balances: SlotVector<SettlementSlot>,
}

impl SettlementLogSlab {
    pub fn decode(blob: &[u8], config: &DecoderConfig) -> Result<Self> {
        config.validate()?;

        let mut reader = ByteReader::new(blob);
        let market = Address::new(reader.read_array()?);
        let prev = Address::new(reader.read_array()?);
        let next = Address::new(reader.read_array()?);
        // Reserved
        reader.skip(4 + 2)?;

        let headers = CollectionHeader::read_table(&mut reader, config.settlement_header_slots)?;
        let pool = PagePool::new(reader.rest())?;

        let tree = SlabTree::decode(&headers[0], &pool)?;
        let balances = SlotVector::decode(&headers[1], &pool)?;
        if config.check_leaf_count {
            tree.check_leaf_count();
        }

        Ok(Self {
            market,
            prev,
            next,
            headers,
            tree,
            balances,
        })
    }

    /// Join leaves to their balance slots
    pub fn assemble(&self) -> Result<SettlementLog> {
        let entries = self
            .tree
            .leaves()
            .map(|leaf| {
                let slot = self.balances.get(leaf.slot).ok_or_else(|| {
                    Error::MalformedLayout(format!(
                        "settlement leaf references slot {} of {} balance slots",
                        leaf.slot,
                        self.balances.len()
                    ))
                })?;
                Ok(SettlementEntry {
                    owner: leaf.owner,
                    mkt_balance: slot.mkt_balance,
                    prc_balance: slot.prc_balance,
                    updated_at: slot.updated_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            market = %self.market,
            entries = entries.len(),
            has_next = !self.next.is_sentinel(),
            "Assembled settlement log"
        );

        Ok(SettlementLog {
            market: self.market,
            prev: self.prev,
            next: self.next,
            entries,
        })
    }
}

/// One settlement log account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementLog {
    pub market: Address,
    /// Previous log, or the sentinel
    pub prev: Address,
    /// Next log, or the sentinel
    pub next: Address,
    pub entries: Vec<SettlementEntry>,
}

impl SettlementLog {
    pub fn decode(blob: &[u8], config: &DecoderConfig) -> Result<Self> {
        SettlementLogSlab::decode(blob, config)?.assemble()
    }

    /// Decode keeping only the entries of `owner`
    pub fn decode_for_owner(blob: &[u8], config: &DecoderConfig, owner: &Address) -> Result<Self> {
        let mut log = Self::decode(blob, config)?;
        log.entries.retain(|entry| &entry.owner == owner);
        Ok(log)
    }

    pub fn entries_for<'a>(&'a self, owner: &'a Address) -> impl Iterator<Item = &'a SettlementEntry> + 'a {
        self.entries.iter().filter(move |entry| &entry.owner == owner)
    }

    pub fn prev_log(&self) -> Option<Address> {
        self.prev.non_sentinel()
    }

    pub fn next_log(&self) -> Option<Address> {
        self.next.non_sentinel()
    }
}

/// Fetches settlement log accounts for a [`SettlementChain`]
pub trait LogSource {
    /// Raw bytes of the account at `address`
    ///
    /// Failures should be reported as [`Error::Source`].
    fn fetch(&mut self, address: &Address) -> Result<Vec<u8>>;
}

impl LogSource for std::collections::HashMap<Address, Vec<u8>> {
    fn fetch(&mut self, address: &Address) -> Result<Vec<u8>> {
        self.get(address)
            .cloned()
            .ok_or_else(|| Error::Source(format!("account {} not available", address)))
    }
}

impl<S: LogSource + ?Sized> LogSource for &mut S {
    fn fetch(&mut self, address: &Address) -> Result<Vec<u8>> {
        (**self).fetch(address)
    }
}

/// Lazy walk over the entries of a settlement log chain
///
/// Accounts are fetched one at a time as the previous account's entries run
/// out, following `next` until the sentinel. The walk stops with an error on
/// the first failed fetch or decode, on an address seen twice, or after
/// `max_chain_len` accounts.
pub struct SettlementChain<S> {
    source: S,
    config: DecoderConfig,
    owner: Option<Address>,
    next: Option<Address>,
    last: Option<Address>,
    visited: HashSet<Address>,
    pending: std::vec::IntoIter<SettlementEntry>,
}

impl<S: LogSource> SettlementChain<S> {
    /// Start at `first`, usually the market's first settlement log
    pub fn new(source: S, first: Address, config: DecoderConfig) -> Self {
        Self {
            source,
            config,
            owner: None,
            next: first.non_sentinel(),
            last: None,
            visited: HashSet::new(),
            pending: Vec::new().into_iter(),
        }
    }

    /// Only yield entries belonging to `owner`
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Accounts fetched so far
    pub fn logs_visited(&self) -> usize {
        self.visited.len()
    }

    fn load(&mut self, address: Address) -> Result<()> {
        if self.visited.len() >= self.config.max_chain_len {
            return Err(Error::MalformedLayout(format!(
                "settlement chain longer than {} accounts",
                self.config.max_chain_len
            )));
        }
        if !self.visited.insert(address) {
            return Err(Error::MalformedLayout(format!(
                "settlement chain revisits {}",
                address
            )));
        }

        let blob = self.source.fetch(&address)?;
        let log = SettlementLog::decode(&blob, &self.config)?;

        if let Some(last) = self.last {
            if log.prev != last {
                warn!(%address, prev = %log.prev, expected = %last, "Settlement log back link mismatch");
            }
        }
        debug!(%address, entries = log.entries.len(), "Loaded settlement log");

        self.last = Some(address);
        self.next = log.next_log();
        let mut entries = log.entries;
        if let Some(owner) = &self.owner {
            entries.retain(|entry| &entry.owner == owner);
        }
        self.pending = entries.into_iter();
        Ok(())
    }
}

impl<S: LogSource> Iterator for SettlementChain<S> {
    type Item = Result<SettlementEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.next() {
                return Some(Ok(entry));
            }
            let address = self.next.take()?;
            if let Err(e) = self.load(address) {
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_short_blob() {
        assert!(matches!(
            SettlementLog::decode(&[0u8; 64], &DecoderConfig::default()),
            Err(Error::TruncatedRecord { .. })
        ));
    }

    #[test]
    fn test_missing_pages() {
        let blob = vec![0u8; LOG_PREAMBLE_SIZE + 2 * crate::slab::COLLECTION_HEADER_SIZE + 100];
        assert!(matches!(
            SettlementLog::decode(&blob, &DecoderConfig::default()),
            Err(Error::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_chain_starting_at_sentinel_is_empty() {
        let source: HashMap<Address, Vec<u8>> = HashMap::new();
        let mut chain = SettlementChain::new(source, Address::ZERO, DecoderConfig::default());
        assert!(chain.next().is_none());
        assert_eq!(chain.logs_visited(), 0);
    }

    #[test]
    fn test_chain_fetch_failure() {
        let source: HashMap<Address, Vec<u8>> = HashMap::new();
        let start = Address::new([7; 32]);
        let mut chain = SettlementChain::new(source, start, DecoderConfig::default());

        assert!(matches!(chain.next(), Some(Err(Error::Source(_)))));
        // The walk ends after an error
        assert!(chain.next().is_none());
    }
}
