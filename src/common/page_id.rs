//! Table and page identifier types.

use std::fmt;

/// Identifies one table (one heap file) in the catalog.
///
/// Table IDs are assigned by whoever loads the catalog; the storage
/// core never mints them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl TableId {
    /// Create a new TableId.
    #[inline]
    pub fn new(id: u32) -> Self {
        TableId(id)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table({})", self.0)
    }
}

/// Identifies a page uniquely across the whole store.
///
/// A page belongs to exactly one table file; `page_no` is the page's
/// position within that file. Pages are numbered densely `0..num_pages`
/// with no gaps, and a `PageId` is never reused for a different page
/// once assigned.
///
/// # Example
/// ```
/// use stratadb::common::{PageId, TableId};
///
/// let pid = PageId::new(TableId::new(1), 42);
/// assert_eq!(pid.page_no, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// The table whose heap file holds this page.
    pub table: TableId,
    /// Position of the page within the file (page k lives at byte
    /// offset `k * PAGE_SIZE`).
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(table: TableId, page_no: u32) -> Self {
        PageId { table, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}.{})", self.table.0, self.page_no)
    }
}
