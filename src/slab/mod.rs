//! Paged slab decoding
//!
//! Slab accounts carve fixed-layout collections out of a small pool of
//! 16 KiB pages. Each collection owns a header that lists which pages hold
//! its items.
//!
//! # Architecture
//!
//! ```text
//! Account blob
//!   ├─→ Preamble (account specific)
//!   ├─→ CollectionHeader table
//!   │     └─→ item_count + page_indices[16]
//!   └─→ PagePool (6 × 16384 bytes)
//!         ├─→ SlabTree   (56-byte critbit nodes, arena indexed)
//!         └─→ SlotVector (fixed-size payload records)
//! ```
//!
//! A tree leaf's `slot` is the index of its payload in the paired vector.

pub mod header;
pub mod page;
pub mod reader;
pub mod tree;
pub mod vector;

pub use header::{CollectionHeader, COLLECTION_HEADER_SIZE, MAX_COLLECTION_PAGES};
pub use page::{PagePool, PAGE_COUNT, PAGE_SIZE};
pub use reader::ByteReader;
pub use tree::{LeafNode, SlabTree, TreeMeta, TreeNode, NODE_SIZE};
pub use vector::{OrderSlot, SettlementSlot, SlotRecord, SlotVector, VectorMeta};
