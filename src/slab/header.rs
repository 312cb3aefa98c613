//! Collection header: item count and page-index table

use super::page::{PAGE_COUNT, PAGE_SIZE};
use super::reader::ByteReader;
use crate::error::{Error, Result};
use serde::Serialize;

/// Page slots in a collection header's index table
pub const MAX_COLLECTION_PAGES: usize = 16;

/// Encoded size of one [`CollectionHeader`]
pub const COLLECTION_HEADER_SIZE: usize = 3 * 8 + MAX_COLLECTION_PAGES * 2;

/// Per-collection metadata
///
/// Resolves a collection's items to the pages holding them. Only the first
/// `total_pages` entries of `page_indices` are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionHeader {
    pub header_size: u64,
    pub offset_size: u64,
    pub item_count: u64,
    pub page_indices: [u16; MAX_COLLECTION_PAGES],
}

impl CollectionHeader {
    /// Read one header
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let header_size = reader.read_u64()?;
        let offset_size = reader.read_u64()?;
        let item_count = reader.read_u64()?;
        let mut page_indices = [0u16; MAX_COLLECTION_PAGES];
        for index in page_indices.iter_mut() {
            *index = reader.read_u16()?;
        }
        Ok(Self {
            header_size,
            offset_size,
            item_count,
            page_indices,
        })
    }

    /// Read a table of `count` consecutive headers
    pub fn read_table(reader: &mut ByteReader<'_>, count: usize) -> Result<Vec<Self>> {
        (0..count).map(|_| Self::read(reader)).collect()
    }

    /// Records of `record_size` bytes that fit on one page
    ///
    /// The divisor subtracts both `header_size` and `offset_size` even though
    /// only `offset_size` bytes are skipped on each page. This matches the
    /// on-chain writer.
    pub fn items_per_page(&self, record_size: usize) -> Result<usize> {
        let reserved = self
            .header_size
            .checked_add(self.offset_size)
            .filter(|&reserved| reserved < PAGE_SIZE as u64)
            .ok_or_else(|| {
                Error::MalformedLayout(format!(
                    "header_size {} + offset_size {} leaves no room on a {} byte page",
                    self.header_size, self.offset_size, PAGE_SIZE
                ))
            })?;

        let per_page = (PAGE_SIZE - reserved as usize) / record_size.max(1);
        if per_page == 0 {
            return Err(Error::MalformedLayout(format!(
                "no {} byte record fits after reserving {} bytes",
                record_size, reserved
            )));
        }
        Ok(per_page)
    }

    /// Number of pages the collection occupies
    pub fn total_pages(&self, record_size: usize) -> Result<usize> {
        let per_page = self.items_per_page(record_size)? as u64;
        let pages = self.item_count.div_ceil(per_page);
        if pages > MAX_COLLECTION_PAGES as u64 {
            return Err(Error::MalformedLayout(format!(
                "{} items need {} pages, header indexes at most {}",
                self.item_count, pages, MAX_COLLECTION_PAGES
            )));
        }
        Ok(pages as usize)
    }

    /// Item count as an in-memory length
    pub fn item_len(&self) -> Result<usize> {
        usize::try_from(self.item_count).map_err(|_| {
            Error::MalformedLayout(format!("item count {} overflows", self.item_count))
        })
    }

    /// Byte length of the reserved prefix skipped on every page
    pub fn page_prefix(&self) -> Result<usize> {
        usize::try_from(self.offset_size)
            .ok()
            .filter(|&prefix| prefix <= PAGE_SIZE)
            .ok_or_else(|| {
                Error::MalformedLayout(format!(
                    "offset_size {} exceeds the page size",
                    self.offset_size
                ))
            })
    }

    /// Validated page indices in use, in collection order
    ///
    /// Every index must address one of the [`PAGE_COUNT`] pages and appear
    /// only once.
    pub fn used_page_indices(&self, record_size: usize) -> Result<&[u16]> {
        let used = &self.page_indices[..self.total_pages(record_size)?];
        for (position, &index) in used.iter().enumerate() {
            if index as usize >= PAGE_COUNT {
                return Err(Error::MalformedLayout(format!(
                    "page index {} at position {} out of range",
                    index, position
                )));
            }
            if used[..position].contains(&index) {
                return Err(Error::MalformedLayout(format!(
                    "page index {} referenced twice",
                    index
                )));
            }
        }
        Ok(used)
    }
}
