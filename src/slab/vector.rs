//! Value vector collection
//!
//! A dense array of fixed-size records. Record `i` is the payload of the
//! tree leaf whose `slot` is `i`.

use super::header::CollectionHeader;
use super::page::PagePool;
use super::reader::ByteReader;
use crate::error::Result;
use serde::Serialize;
use tracing::debug;

/// Encoded size of the allocator metadata on a vector's first page
pub const VECTOR_META_SIZE: usize = 8;

/// A fixed-width record stored in a [`SlotVector`]
pub trait SlotRecord: Sized {
    /// Stride between consecutive records in a page
    const RECORD_SIZE: usize;

    /// Decode from exactly `RECORD_SIZE` bytes
    fn read(reader: &mut ByteReader<'_>) -> Result<Self>;
}

/// Resting order payload (16 meaningful bytes in a 32-byte record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSlot {
    pub amount: u64,
    pub expiry: i64,
}

impl SlotRecord for OrderSlot {
    const RECORD_SIZE: usize = 32;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            amount: reader.read_u64()?,
            expiry: reader.read_i64()?,
        })
    }
}

/// Settlement balance payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementSlot {
    pub mkt_balance: u64,
    pub prc_balance: u64,
    pub updated_at: i64,
}

impl SlotRecord for SettlementSlot {
    const RECORD_SIZE: usize = 24;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            mkt_balance: reader.read_u64()?,
            prc_balance: reader.read_u64()?,
            updated_at: reader.read_i64()?,
        })
    }
}

/// Allocator metadata stored on the first page of a vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VectorMeta {
    pub free_top: u32,
    pub next_index: u32,
}

/// Decoded vector collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotVector<T> {
    pub meta: VectorMeta,
    pub records: Vec<T>,
}

impl<T: SlotRecord> SlotVector<T> {
    /// Decode a vector collection from its pages
    pub fn decode(header: &CollectionHeader, pool: &PagePool<'_>) -> Result<Self> {
        let pages = pool.select(header, T::RECORD_SIZE)?;
        let per_page = header.items_per_page(T::RECORD_SIZE)?;
        let prefix = header.page_prefix()?;
        let total = header.item_len()?;

        let mut meta = VectorMeta::default();
        let mut records = Vec::with_capacity(total);

        for (page_no, page) in pages.iter().enumerate() {
            let mut reader = ByteReader::new(page);
            reader.skip(prefix)?;
            if page_no == 0 {
                meta = VectorMeta {
                    free_top: reader.read_u32()?,
                    next_index: reader.read_u32()?,
                };
            }
            for _ in 0..per_page {
                if records.len() == total {
                    break;
                }
                let mut record = ByteReader::new(reader.take(T::RECORD_SIZE)?);
                records.push(T::read(&mut record)?);
            }
        }

        debug!(
            records = records.len(),
            pages = pages.len(),
            record_size = T::RECORD_SIZE,
            next_index = meta.next_index,
            "Decoded slot vector"
        );
        Ok(Self { meta, records })
    }
}

impl<T> SlotVector<T> {
    /// Record for a leaf's slot
    pub fn get(&self, slot: u32) -> Option<&T> {
        self.records.get(slot as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
