//! Critbit tree collection
//!
//! A tree collection is a node table of 56-byte records spread over the
//! collection's pages. Nodes reference each other by table index, so the
//! decoded table is kept as an arena (`Vec<TreeNode>`) and never as a
//! pointer graph.
//!
//! ```text
//! page 0: [offset_size prefix][TreeMeta 32B][node 0][node 1]...
//! page 1: [offset_size prefix][node n][node n+1]...
//! ```

use super::header::CollectionHeader;
use super::page::PagePool;
use super::reader::ByteReader;
use crate::address::Address;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Encoded size of one tree node
pub const NODE_SIZE: usize = 56;

/// Encoded size of the allocator metadata on a tree's first page
pub const TREE_META_SIZE: usize = 32;

pub const TAG_UNUSED: u32 = 0;
pub const TAG_INNER: u32 = 1;
pub const TAG_LEAF: u32 = 2;
pub const TAG_FREE: u32 = 3;
pub const TAG_FREE_TAIL: u32 = 4;

/// Allocator metadata stored on the first page of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeMeta {
    pub bump_index: u64,
    pub free_list_len: u64,
    pub free_list_head: u32,
    pub root_node: u32,
    pub leaf_count: u64,
}

impl TreeMeta {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            bump_index: reader.read_u64()?,
            free_list_len: reader.read_u64()?,
            free_list_head: reader.read_u32()?,
            root_node: reader.read_u32()?,
            leaf_count: reader.read_u64()?,
        })
    }
}

/// Terminal node pointing into the paired value vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeafNode {
    /// Index into the paired [`SlotVector`](super::vector::SlotVector)
    pub slot: u32,
    #[serde(skip)]
    pub key: [u8; 16],
    pub owner: Address,
}

impl LeafNode {
    /// Price embedded in the key's upper 8 bytes
    pub fn price(&self) -> u64 {
        let mut high = [0u8; 8];
        high.copy_from_slice(&self.key[8..]);
        u64::from_le_bytes(high)
    }

    /// The key as the 128-bit integer the tree is ordered by
    pub fn key_value(&self) -> u128 {
        u128::from_le_bytes(self.key)
    }
}

/// One entry of the node table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Never allocated
    Unused,
    /// Branch on the first bit after `prefix_len` shared bits
    Inner {
        #[serde(skip)]
        key: [u8; 16],
        prefix_len: u32,
        children: [u32; 2],
    },
    Leaf(LeafNode),
    /// Recycled slot, links to the next free slot
    Free { next: u32 },
    /// Last slot of the free list
    FreeTail { next: u32 },
}

impl TreeNode {
    /// Decode one 56-byte record
    ///
    /// `index` is the node's table position, used for error reporting.
    pub fn decode(record: &[u8], index: usize) -> Result<Self> {
        let mut reader = ByteReader::new(record);
        let tag = reader.read_u32()?;
        let node = match tag {
            TAG_UNUSED => TreeNode::Unused,
            TAG_INNER => TreeNode::Inner {
                key: reader.read_array()?,
                prefix_len: reader.read_u32()?,
                children: [reader.read_u32()?, reader.read_u32()?],
            },
            TAG_LEAF => TreeNode::Leaf(LeafNode {
                slot: reader.read_u32()?,
                key: reader.read_array()?,
                owner: Address::new(reader.read_array()?),
            }),
            TAG_FREE => TreeNode::Free {
                next: reader.read_u32()?,
            },
            TAG_FREE_TAIL => TreeNode::FreeTail {
                next: reader.read_u32()?,
            },
            tag => return Err(Error::InvalidNodeTag { tag, index }),
        };
        Ok(node)
    }

    pub fn tag(&self) -> u32 {
        match self {
            TreeNode::Unused => TAG_UNUSED,
            TreeNode::Inner { .. } => TAG_INNER,
            TreeNode::Leaf(_) => TAG_LEAF,
            TreeNode::Free { .. } => TAG_FREE,
            TreeNode::FreeTail { .. } => TAG_FREE_TAIL,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            TreeNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/// Decoded tree collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabTree {
    pub meta: TreeMeta,
    pub nodes: Vec<TreeNode>,
}

impl SlabTree {
    /// Decode a tree collection from its pages
    pub fn decode(header: &CollectionHeader, pool: &PagePool<'_>) -> Result<Self> {
        let pages = pool.select(header, NODE_SIZE)?;
        let per_page = header.items_per_page(NODE_SIZE)?;
        let prefix = header.page_prefix()?;
        let total = header.item_len()?;

        let mut meta = TreeMeta::default();
        let mut nodes = Vec::with_capacity(total);

        for (page_no, page) in pages.iter().enumerate() {
            let mut reader = ByteReader::new(page);
            reader.skip(prefix)?;
            if page_no == 0 {
                meta = TreeMeta::read(&mut reader)?;
            }
            for _ in 0..per_page {
                if nodes.len() == total {
                    break;
                }
                let record = reader.take(NODE_SIZE)?;
                nodes.push(TreeNode::decode(record, nodes.len())?);
            }
        }

        let tree = Self { meta, nodes };
        debug!(
            nodes = tree.nodes.len(),
            pages = pages.len(),
            leaves = tree.leaf_count(),
            root = tree.meta.root_node,
            "Decoded slab tree"
        );
        Ok(tree)
    }

    /// All leaves in node-table order
    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> + '_ {
        self.nodes.iter().filter_map(TreeNode::as_leaf)
    }

    /// Number of leaves found by scanning the table
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Warn when the stored leaf count disagrees with the scanned one
    pub fn check_leaf_count(&self) -> bool {
        let scanned = self.leaf_count() as u64;
        if scanned != self.meta.leaf_count {
            warn!(
                stored = self.meta.leaf_count,
                scanned, "Tree leaf count does not match its leaves"
            );
            return false;
        }
        true
    }

    fn node(&self, index: u32) -> Result<&TreeNode> {
        self.nodes.get(index as usize).ok_or_else(|| {
            Error::MalformedLayout(format!(
                "node index {} outside table of {} nodes",
                index,
                self.nodes.len()
            ))
        })
    }

    /// Leaves in ascending key order, walking from the root
    ///
    /// Only nodes reachable from `root_node` are visited. A reachable node
    /// that is not an inner node or a leaf, an out-of-range child or a cycle
    /// is reported as [`Error::MalformedLayout`]. A table without leaves
    /// yields nothing whatever `root_node` holds; the stored `leaf_count` is
    /// not consulted.
    pub fn iter_ordered(&self) -> Result<Vec<LeafNode>> {
        if self.leaves().next().is_none() {
            return Ok(Vec::new());
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![self.meta.root_node];
        let mut leaves = Vec::new();

        while let Some(index) = stack.pop() {
            let node = self.node(index)?;
            if std::mem::replace(&mut visited[index as usize], true) {
                return Err(Error::MalformedLayout(format!(
                    "node {} reached twice from the root",
                    index
                )));
            }
            match node {
                TreeNode::Inner { children, .. } => {
                    // Lower half first
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
                TreeNode::Leaf(leaf) => leaves.push(*leaf),
                other => {
                    return Err(Error::MalformedLayout(format!(
                        "node {} reachable from the root has tag {}",
                        index,
                        other.tag()
                    )))
                }
            }
        }

        Ok(leaves)
    }

    /// Table indices on the free list, head first
    pub fn free_list(&self) -> Result<Vec<u32>> {
        let mut free = Vec::new();
        if self.meta.free_list_len == 0 {
            return Ok(free);
        }

        let mut index = self.meta.free_list_head;
        loop {
            if free.len() >= self.nodes.len() {
                return Err(Error::MalformedLayout(
                    "free list does not terminate".to_string(),
                ));
            }
            free.push(index);
            match self.node(index)? {
                TreeNode::Free { next } => index = *next,
                TreeNode::FreeTail { .. } => break,
                other => {
                    return Err(Error::MalformedLayout(format!(
                        "free list reaches node {} with tag {}",
                        index,
                        other.tag()
                    )))
                }
            }
        }

        if free.len() as u64 != self.meta.free_list_len {
            warn!(
                stored = self.meta.free_list_len,
                walked = free.len(),
                "Free list length does not match its chain"
            );
        }
        Ok(free)
    }
}
