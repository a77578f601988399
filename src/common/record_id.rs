//! Record locator type.

use std::fmt;

use crate::common::PageId;

/// Locates a tuple: the page it lives on plus its slot index within
/// that page.
///
/// A `RecordId` is assigned when a tuple is inserted (and when it is
/// produced by a scan), and is what delete/update use to find the
/// tuple again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    /// The page housing the tuple.
    pub page_id: PageId,
    /// Slot index within the page.
    pub slot: usize,
}

impl RecordId {
    /// Create a new RecordId.
    #[inline]
    pub fn new(page_id: PageId, slot: usize) -> Self {
        RecordId { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.page_id, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableId;

    #[test]
    fn test_record_id_equality() {
        let pid = PageId::new(TableId::new(1), 0);
        assert_eq!(RecordId::new(pid, 3), RecordId::new(pid, 3));
        assert_ne!(RecordId::new(pid, 3), RecordId::new(pid, 4));
    }

    #[test]
    fn test_record_id_display() {
        let rid = RecordId::new(PageId::new(TableId::new(2), 1), 7);
        assert_eq!(format!("{}", rid), "Page(2.1)[7]");
    }
}
