//! Synthetic slab account builders shared by integration tests

#![allow(dead_code)]

use orderslab::slab::{MAX_COLLECTION_PAGES, NODE_SIZE, PAGE_COUNT, PAGE_SIZE};

/// Reserved prefix used by every test collection
pub const OFFSET_SIZE: u64 = 8;
/// Tree header_size matching its 32-byte metadata
pub const TREE_HEADER_SIZE: u64 = 32;
/// Vector header_size matching its 8-byte metadata
pub const VECTOR_HEADER_SIZE: u64 = 8;

pub const ORDER_RECORD_SIZE: usize = 32;
pub const SETTLEMENT_RECORD_SIZE: usize = 24;

fn node(tag: u32, body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; NODE_SIZE];
    bytes[..4].copy_from_slice(&tag.to_le_bytes());
    bytes[4..4 + body.len()].copy_from_slice(body);
    bytes
}

pub fn unused() -> Vec<u8> {
    node(0, &[])
}

pub fn inner(prefix_len: u32, children: [u32; 2]) -> Vec<u8> {
    let mut body = vec![0u8; 16];
    body.extend_from_slice(&prefix_len.to_le_bytes());
    body.extend_from_slice(&children[0].to_le_bytes());
    body.extend_from_slice(&children[1].to_le_bytes());
    node(1, &body)
}

pub fn leaf(slot: u32, key: [u8; 16], owner: [u8; 32]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&slot.to_le_bytes());
    body.extend_from_slice(&key);
    body.extend_from_slice(&owner);
    node(2, &body)
}

pub fn free(next: u32) -> Vec<u8> {
    node(3, &next.to_le_bytes())
}

pub fn free_tail() -> Vec<u8> {
    node(4, &0u32.to_le_bytes())
}

pub fn raw_node(tag: u32) -> Vec<u8> {
    node(tag, &[])
}

/// Key with `price` in the upper 8 bytes and `seq` in the lower 8
pub fn order_key(price: u64, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&seq.to_le_bytes());
    key[8..].copy_from_slice(&price.to_le_bytes());
    key
}

pub fn tree_meta(free_list_len: u64, free_list_head: u32, root_node: u32, leaf_count: u64) -> Vec<u8> {
    let mut meta = Vec::new();
    meta.extend_from_slice(&0u64.to_le_bytes());
    meta.extend_from_slice(&free_list_len.to_le_bytes());
    meta.extend_from_slice(&free_list_head.to_le_bytes());
    meta.extend_from_slice(&root_node.to_le_bytes());
    meta.extend_from_slice(&leaf_count.to_le_bytes());
    meta
}

pub fn vector_meta(free_top: u32, next_index: u32) -> Vec<u8> {
    let mut meta = Vec::new();
    meta.extend_from_slice(&free_top.to_le_bytes());
    meta.extend_from_slice(&next_index.to_le_bytes());
    meta
}

pub fn order_slot(amount: u64, expiry: i64) -> Vec<u8> {
    let mut bytes = vec![0u8; ORDER_RECORD_SIZE];
    bytes[..8].copy_from_slice(&amount.to_le_bytes());
    bytes[8..16].copy_from_slice(&expiry.to_le_bytes());
    bytes
}

pub fn settlement_slot(mkt_balance: u64, prc_balance: u64, updated_at: i64) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&mkt_balance.to_le_bytes());
    bytes.extend_from_slice(&prc_balance.to_le_bytes());
    bytes.extend_from_slice(&updated_at.to_le_bytes());
    bytes
}

/// Encoded collection header
pub fn header(header_size: u64, offset_size: u64, item_count: u64, pages: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&header_size.to_le_bytes());
    bytes.extend_from_slice(&offset_size.to_le_bytes());
    bytes.extend_from_slice(&item_count.to_le_bytes());
    let mut indices = [0u16; MAX_COLLECTION_PAGES];
    indices[..pages.len()].copy_from_slice(pages);
    for index in indices {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

/// The 6-page region of an account under construction
pub struct Pages {
    data: Vec<u8>,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE * PAGE_COUNT],
        }
    }
}

impl Pages {
    /// Lay out one collection and return its encoded header
    ///
    /// Records fill `pages` in order; `meta` goes after the prefix on the
    /// first page.
    pub fn collection(
        &mut self,
        header_size: u64,
        record_size: usize,
        pages: &[u16],
        meta: &[u8],
        records: &[Vec<u8>],
    ) -> Vec<u8> {
        let per_page = (PAGE_SIZE - (header_size + OFFSET_SIZE) as usize) / record_size;
        let prefix = OFFSET_SIZE as usize;

        if !records.is_empty() {
            let base = pages[0] as usize * PAGE_SIZE + prefix;
            self.data[base..base + meta.len()].copy_from_slice(meta);
        }
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.len(), record_size);
            let page_no = i / per_page;
            let position = i % per_page;
            let skip = if page_no == 0 { meta.len() } else { 0 };
            let base = pages[page_no] as usize * PAGE_SIZE + prefix + skip + position * record_size;
            self.data[base..base + record_size].copy_from_slice(record);
        }

        header(header_size, OFFSET_SIZE, records.len() as u64, pages)
    }

    pub fn tree(&mut self, pages: &[u16], meta: &[u8], nodes: &[Vec<u8>]) -> Vec<u8> {
        self.collection(TREE_HEADER_SIZE, NODE_SIZE, pages, meta, nodes)
    }

    pub fn orders(&mut self, pages: &[u16], slots: &[Vec<u8>]) -> Vec<u8> {
        let meta = vector_meta(0, slots.len() as u32);
        self.collection(VECTOR_HEADER_SIZE, ORDER_RECORD_SIZE, pages, &meta, slots)
    }

    pub fn settlements(&mut self, pages: &[u16], slots: &[Vec<u8>]) -> Vec<u8> {
        let meta = vector_meta(0, slots.len() as u32);
        self.collection(VECTOR_HEADER_SIZE, SETTLEMENT_RECORD_SIZE, pages, &meta, slots)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Order book account: version, 4 headers, pages
pub fn order_book_blob(version: u16, headers: [Vec<u8>; 4], pages: &Pages) -> Vec<u8> {
    let mut blob = version.to_le_bytes().to_vec();
    for header in headers {
        blob.extend_from_slice(&header);
    }
    blob.extend_from_slice(pages.bytes());
    blob
}

/// Settlement log account: 3 addresses, reserved fields, headers, pages
pub fn settlement_blob(
    market: [u8; 32],
    prev: [u8; 32],
    next: [u8; 32],
    headers: &[Vec<u8>],
    pages: &Pages,
) -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&market);
    blob.extend_from_slice(&prev);
    blob.extend_from_slice(&next);
    blob.extend_from_slice(&0u32.to_le_bytes());
    blob.extend_from_slice(&0u16.to_le_bytes());
    for header in headers {
        blob.extend_from_slice(header);
    }
    blob.extend_from_slice(pages.bytes());
    blob
}

/// An empty collection header (no items, no pages)
pub fn empty_header() -> Vec<u8> {
    header(TREE_HEADER_SIZE, OFFSET_SIZE, 0, &[])
}
