//! Order book accounts
//!
//! ```text
//! [u16 version][bid tree hdr][ask tree hdr][bid vec hdr][ask vec hdr][6 pages]
//! ```

use crate::address::Address;
use crate::codec::order_id;
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::slab::{ByteReader, CollectionHeader, OrderSlot, PagePool, SlabTree, SlotVector};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Collection headers in an order book account
pub const BOOK_HEADER_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// A resting order joined from its tree leaf and vector slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub side: Side,
    pub order_id: String,
    #[serde(skip)]
    pub key: [u8; 16],
    pub price: u64,
    pub owner: Address,
    pub amount: u64,
    pub expiry: i64,
}

/// Both sides of the book as raw collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBookSlab {
    pub version: u16,
    pub headers: [CollectionHeader; BOOK_HEADER_COUNT],
    pub bid_tree: SlabTree,
    pub ask_tree: SlabTree,
    pub bid_orders: SlotVector<OrderSlot>,
    pub ask_orders: SlotVector<OrderSlot>,
}

type SideCollections = (SlabTree, SlotVector<OrderSlot>);

fn decode_side(
    tree_header: &CollectionHeader,
    vec_header: &CollectionHeader,
    pool: &PagePool<'_>,
) -> Result<SideCollections> {
    Ok((
        SlabTree::decode(tree_header, pool)?,
        SlotVector::decode(vec_header, pool)?,
    ))
}

impl OrderBookSlab {
    pub fn decode(blob: &[u8], config: &DecoderConfig) -> Result<Self> {
        let mut reader = ByteReader::new(blob);
        let version = reader.read_u16()?;
        let headers = [
            CollectionHeader::read(&mut reader)?,
            CollectionHeader::read(&mut reader)?,
            CollectionHeader::read(&mut reader)?,
            CollectionHeader::read(&mut reader)?,
        ];
        let pool = PagePool::new(reader.rest())?;

        let [bid_tree_hdr, ask_tree_hdr, bid_vec_hdr, ask_vec_hdr] = &headers;
        let (bids, asks) = rayon::join(
            || decode_side(bid_tree_hdr, bid_vec_hdr, &pool),
            || decode_side(ask_tree_hdr, ask_vec_hdr, &pool),
        );
        let (bid_tree, bid_orders) = bids?;
        let (ask_tree, ask_orders) = asks?;

        if config.check_leaf_count {
            bid_tree.check_leaf_count();
            ask_tree.check_leaf_count();
        }

        Ok(Self {
            version,
            headers,
            bid_tree,
            ask_tree,
            bid_orders,
            ask_orders,
        })
    }

    /// Join leaves to their order slots
    pub fn assemble(&self) -> Result<OrderBook> {
        Ok(OrderBook {
            bids: assemble_side(Side::Bid, &self.bid_tree, &self.bid_orders)?,
            asks: assemble_side(Side::Ask, &self.ask_tree, &self.ask_orders)?,
        })
    }
}

fn assemble_side(
    side: Side,
    tree: &SlabTree,
    orders: &SlotVector<OrderSlot>,
) -> Result<Vec<OrderRecord>> {
    let records = tree
        .leaves()
        .map(|leaf| {
            let slot = orders.get(leaf.slot).ok_or_else(|| {
                Error::MalformedLayout(format!(
                    "{} leaf references slot {} of {} order slots",
                    side,
                    leaf.slot,
                    orders.len()
                ))
            })?;
            Ok(OrderRecord {
                side,
                order_id: order_id::encode(&leaf.key),
                key: leaf.key,
                price: leaf.price(),
                owner: leaf.owner,
                amount: slot.amount,
                expiry: slot.expiry,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(%side, orders = records.len(), "Assembled book side");
    Ok(records)
}

/// Resting orders of one market
///
/// Orders appear in node-table order, which is not price order. Use
/// [`OrderBook::sorted`] for price-time priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderBook {
    pub bids: Vec<OrderRecord>,
    pub asks: Vec<OrderRecord>,
}

impl OrderBook {
    /// Decode and assemble an order book account
    pub fn decode(blob: &[u8]) -> Result<Self> {
        Self::decode_with_config(blob, &DecoderConfig::default())
    }

    pub fn decode_with_config(blob: &[u8], config: &DecoderConfig) -> Result<Self> {
        OrderBookSlab::decode(blob, config)?.assemble()
    }

    /// Bids best (highest) first, asks best (lowest) first
    ///
    /// Equal prices keep order-id order, which tracks the key's sequence
    /// bits.
    pub fn sorted(mut self) -> Self {
        self.bids
            .sort_by(|a, b| b.price.cmp(&a.price).then_with(|| a.order_id.cmp(&b.order_id)));
        self.asks
            .sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.order_id.cmp(&b.order_id)));
        self
    }

    pub fn best_bid(&self) -> Option<&OrderRecord> {
        self.bids.iter().max_by_key(|o| o.price)
    }

    pub fn best_ask(&self) -> Option<&OrderRecord> {
        self.asks.iter().min_by_key(|o| o.price)
    }

    /// All orders placed by `owner`
    pub fn orders_for<'a>(&'a self, owner: &'a Address) -> impl Iterator<Item = &'a OrderRecord> + 'a {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .filter(move |o| &o.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
