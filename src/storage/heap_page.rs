//! Heap page - the on-disk slotted page format.
//!
//! A [`HeapPage`] is a fixed-size byte buffer holding a presence
//! bitmap followed by fixed-width tuple slots.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::tuple::{Schema, Tuple};

/// One page of a heap file.
///
/// # Page Layout
/// ```text
/// ┌──────────────────┬─────────┬─────────┬─────────┬──────────┐
/// │ presence bitmap  │ slot 0  │ slot 1  │  ...    │ slot S-1 │
/// │ ceil(S/8) bytes  │ R bytes │ R bytes │         │ R bytes  │
/// └──────────────────┴─────────┴─────────┴─────────┴──────────┘
/// ```
/// where `R = schema.row_bytes()` and `S = slots_per_page`. Bit `k` of
/// the bitmap (bit `k % 8` of byte `k / 8`) is `1` when slot `k` holds
/// a tuple. Slot count is derived so header plus slots fit the page:
///
/// `S = floor(PAGE_SIZE * 8 / (R * 8 + 1))`
///
/// There is no other file-level metadata: no checksums, no free-space
/// map. Deleting a tuple only clears its presence bit; the slot bytes
/// stay in place until a later insert reuses the slot.
pub struct HeapPage {
    page_id: PageId,
    schema: Schema,
    data: [u8; PAGE_SIZE],
}

impl HeapPage {
    /// Number of tuple slots a page holds for the given schema.
    pub fn slots_per_page(schema: &Schema) -> usize {
        (PAGE_SIZE * 8) / (schema.row_bytes() * 8 + 1)
    }

    /// Size of the presence bitmap in bytes: one bit per slot,
    /// rounded up.
    pub fn header_bytes(schema: &Schema) -> usize {
        Self::slots_per_page(schema).div_ceil(8)
    }

    /// Create a fresh zeroed page: every slot free.
    pub fn new(page_id: PageId, schema: Schema) -> Self {
        HeapPage {
            page_id,
            schema,
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Reconstruct a page from its on-disk bytes.
    pub fn from_bytes(page_id: PageId, schema: Schema, data: [u8; PAGE_SIZE]) -> Self {
        HeapPage {
            page_id,
            schema,
            data,
        }
    }

    /// The raw page bytes, exactly as they are written to disk.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// The identity of this page.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The schema this page's slots are laid out for.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of slots in this page.
    #[inline]
    pub fn slot_count(&self) -> usize {
        Self::slots_per_page(&self.schema)
    }

    /// Whether slot `slot` currently holds a tuple.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        if slot >= self.slot_count() {
            return false;
        }
        self.data[slot / 8] & (1 << (slot % 8)) != 0
    }

    /// Number of free slots in this page.
    pub fn free_slot_count(&self) -> usize {
        (0..self.slot_count())
            .filter(|&slot| !self.is_slot_used(slot))
            .count()
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        let mask = 1 << (slot % 8);
        if used {
            self.data[slot / 8] |= mask;
        } else {
            self.data[slot / 8] &= !mask;
        }
    }

    fn slot_offset(&self, slot: usize) -> usize {
        Self::header_bytes(&self.schema) + slot * self.schema.row_bytes()
    }

    /// Insert a tuple into the first free slot and return that slot.
    ///
    /// The caller is responsible for setting the tuple's record ID and
    /// for marking the owning cache entry dirty.
    ///
    /// # Errors
    /// - `Error::SchemaMismatch` if the tuple does not fit the schema
    /// - `Error::PageFull` if no slot is free
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<usize> {
        self.schema.check(tuple)?;

        let slot = (0..self.slot_count())
            .find(|&slot| !self.is_slot_used(slot))
            .ok_or(Error::PageFull(self.page_id))?;

        let offset = self.slot_offset(slot);
        let row_bytes = self.schema.row_bytes();
        let schema = self.schema.clone();
        schema.encode(tuple, &mut self.data[offset..offset + row_bytes])?;
        self.set_slot_used(slot, true);
        Ok(slot)
    }

    /// Delete the tuple in slot `slot` by clearing its presence bit.
    ///
    /// The slot bytes are left in place; the slot becomes available to
    /// a future insert. No compaction happens.
    ///
    /// # Errors
    /// Returns `Error::RecordNotFound` if the slot is out of range or
    /// not occupied.
    pub fn delete_tuple(&mut self, slot: usize) -> Result<()> {
        if !self.is_slot_used(slot) {
            return Err(Error::RecordNotFound(RecordId::new(self.page_id, slot)));
        }
        self.set_slot_used(slot, false);
        Ok(())
    }

    /// Read the tuple in slot `slot`, with its record ID filled in.
    ///
    /// # Errors
    /// Returns `Error::RecordNotFound` if the slot is not occupied.
    pub fn tuple_at(&self, slot: usize) -> Result<Tuple> {
        if !self.is_slot_used(slot) {
            return Err(Error::RecordNotFound(RecordId::new(self.page_id, slot)));
        }
        let offset = self.slot_offset(slot);
        let row_bytes = self.schema.row_bytes();
        let mut tuple = self.schema.decode(&self.data[offset..offset + row_bytes]);
        tuple.set_record_id(RecordId::new(self.page_id, slot));
        Ok(tuple)
    }

    /// Iterate over the occupied slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        (0..self.slot_count()).filter_map(move |slot| self.tuple_at(slot).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableId;
    use crate::storage::tuple::{Field, FieldType};

    fn int_schema() -> Schema {
        Schema::new(vec![FieldType::Int])
    }

    fn page() -> HeapPage {
        HeapPage::new(PageId::new(TableId::new(1), 0), int_schema())
    }

    fn int_tuple(v: i64) -> Tuple {
        Tuple::new(vec![Field::Int(v)])
    }

    #[test]
    fn test_slot_math() {
        // 8-byte rows: floor(4096*8 / 65) = 504 slots, 63 header bytes.
        let schema = int_schema();
        assert_eq!(HeapPage::slots_per_page(&schema), 504);
        assert_eq!(HeapPage::header_bytes(&schema), 63);

        // Header + slots must fit in the page.
        assert!(63 + 504 * 8 <= PAGE_SIZE);
    }

    #[test]
    fn test_slot_math_four_slots() {
        // Text(998) rows are 1000 bytes: floor(32768 / 8001) = 4 slots.
        let schema = Schema::new(vec![FieldType::Text(998)]);
        assert_eq!(HeapPage::slots_per_page(&schema), 4);
        assert_eq!(HeapPage::header_bytes(&schema), 1);
    }

    #[test]
    fn test_new_page_is_empty() {
        let page = page();
        assert_eq!(page.free_slot_count(), page.slot_count());
        assert!(!page.is_slot_used(0));
        assert!(page.iter().next().is_none());
    }

    #[test]
    fn test_insert_uses_first_free_slot() {
        let mut page = page();

        assert_eq!(page.insert_tuple(&int_tuple(10)).unwrap(), 0);
        assert_eq!(page.insert_tuple(&int_tuple(20)).unwrap(), 1);

        // Free slot 0, then the next insert reuses it.
        page.delete_tuple(0).unwrap();
        assert_eq!(page.insert_tuple(&int_tuple(30)).unwrap(), 0);
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut page = page();
        let slot = page.insert_tuple(&int_tuple(-7)).unwrap();

        let tuple = page.tuple_at(slot).unwrap();
        assert_eq!(tuple.fields(), &[Field::Int(-7)]);
        assert_eq!(
            tuple.record_id(),
            Some(RecordId::new(page.page_id(), slot))
        );
    }

    #[test]
    fn test_insert_into_full_page() {
        let schema = Schema::new(vec![FieldType::Text(998)]);
        let mut page = HeapPage::new(PageId::new(TableId::new(1), 0), schema);

        for _ in 0..4 {
            page.insert_tuple(&Tuple::new(vec![Field::Text("x".into())]))
                .unwrap();
        }
        assert_eq!(page.free_slot_count(), 0);

        let result = page.insert_tuple(&Tuple::new(vec![Field::Text("y".into())]));
        assert!(matches!(result, Err(Error::PageFull(_))));
    }

    #[test]
    fn test_delete_empty_slot_fails() {
        let mut page = page();
        assert!(matches!(
            page.delete_tuple(3),
            Err(Error::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_tuple_at_empty_slot_fails() {
        let page = page();
        assert!(matches!(page.tuple_at(0), Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_iter_skips_holes() {
        let mut page = page();
        for v in 0..5 {
            page.insert_tuple(&int_tuple(v)).unwrap();
        }
        page.delete_tuple(1).unwrap();
        page.delete_tuple(3).unwrap();

        let values: Vec<i64> = page
            .iter()
            .map(|t| match t.fields()[0] {
                Field::Int(v) => v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![0, 2, 4]);
    }

    #[test]
    fn test_bitmap_round_trips_through_bytes() {
        let mut page = page();
        page.insert_tuple(&int_tuple(1)).unwrap();
        page.insert_tuple(&int_tuple(2)).unwrap();
        page.delete_tuple(0).unwrap();

        let reloaded = HeapPage::from_bytes(page.page_id(), int_schema(), *page.as_bytes());
        assert!(!reloaded.is_slot_used(0));
        assert!(reloaded.is_slot_used(1));
        assert_eq!(
            reloaded.tuple_at(1).unwrap().fields(),
            &[Field::Int(2)]
        );
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let mut page = page();
        let wrong = Tuple::new(vec![Field::Text("no".into())]);
        assert!(matches!(
            page.insert_tuple(&wrong),
            Err(Error::SchemaMismatch)
        ));
    }
}
