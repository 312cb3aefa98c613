//! Page pool for a single account blob

use super::header::CollectionHeader;
use crate::error::{Error, Result};
use tracing::trace;

/// Size of every slab page in bytes
pub const PAGE_SIZE: usize = 16384;

/// Number of pages carried by every slab account
pub const PAGE_COUNT: usize = 6;

/// The fixed set of pages following an account's header table
///
/// Page index 0 starts at byte 0 of the page region. Bytes after the last
/// page are ignored.
#[derive(Debug, Clone, Copy)]
pub struct PagePool<'a> {
    pages: [&'a [u8]; PAGE_COUNT],
}

impl<'a> PagePool<'a> {
    /// Split the page region into [`PAGE_COUNT`] pages
    pub fn new(region: &'a [u8]) -> Result<Self> {
        let needed = PAGE_SIZE * PAGE_COUNT;
        if region.len() < needed {
            return Err(Error::MalformedLayout(format!(
                "page region holds {} bytes, {} pages need {}",
                region.len(),
                PAGE_COUNT,
                needed
            )));
        }

        let mut pages = [&region[..0]; PAGE_COUNT];
        for (index, page) in pages.iter_mut().enumerate() {
            let start = index * PAGE_SIZE;
            *page = &region[start..start + PAGE_SIZE];
        }

        Ok(Self { pages })
    }

    /// Get a page by index
    pub fn page(&self, index: u16) -> Result<&'a [u8]> {
        self.pages
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                Error::MalformedLayout(format!(
                    "page index {} out of range (pool has {} pages)",
                    index, PAGE_COUNT
                ))
            })
    }

    /// Select the pages a collection occupies, in collection order
    pub fn select(&self, header: &CollectionHeader, record_size: usize) -> Result<Vec<&'a [u8]>> {
        let indices = header.used_page_indices(record_size)?;
        trace!(?indices, item_count = header.item_count, record_size, "Selecting collection pages");
        indices.iter().map(|&index| self.page(index)).collect()
    }
}
