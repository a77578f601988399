//! LRU eviction index.
//!
//! A recency-ordered index over the currently cached page identities,
//! used by the buffer pool to pick eviction victims. Implemented as a
//! doubly linked list over an index arena, with a hash map from page
//! identity to node for O(1) positional lookup. No ordering guarantee
//! beyond recency is provided.

use std::collections::HashMap;

use crate::common::PageId;

#[derive(Debug, Clone, Copy)]
struct Node {
    page_id: PageId,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Recency order over cached pages: head = least recently used,
/// tail = most recently used.
#[derive(Default)]
pub struct LruIndex {
    nodes: Vec<Node>,
    free: Vec<usize>,
    map: HashMap<PageId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages tracked.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Mark `page_id` as just used: move it to the most-recently-used
    /// end, inserting it if it isn't tracked yet. O(1).
    pub fn touch(&mut self, page_id: PageId) {
        if let Some(&idx) = self.map.get(&page_id) {
            if self.tail == Some(idx) {
                return;
            }
            self.unlink(idx);
            self.push_back(idx);
        } else {
            let node = Node {
                page_id,
                prev: None,
                next: None,
            };
            let idx = match self.free.pop() {
                Some(idx) => {
                    self.nodes[idx] = node;
                    idx
                }
                None => {
                    self.nodes.push(node);
                    self.nodes.len() - 1
                }
            };
            self.map.insert(page_id, idx);
            self.push_back(idx);
        }
    }

    /// Stop tracking `page_id`. No-op if absent.
    pub fn remove(&mut self, page_id: PageId) {
        if let Some(idx) = self.map.remove(&page_id) {
            self.unlink(idx);
            self.free.push(idx);
        }
    }

    /// Lazily walk the tracked pages from least- to most-recently
    /// used. The eviction scan consumes this until it finds a clean
    /// page.
    pub fn lru_candidates(&self) -> LruCandidates<'_> {
        LruCandidates {
            index: self,
            cursor: self.head,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Node { prev, next, .. } = self.nodes[idx];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_back(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = None;
        match self.tail {
            Some(t) => self.nodes[t].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

/// Iterator from least- to most-recently-used page.
pub struct LruCandidates<'a> {
    index: &'a LruIndex,
    cursor: Option<usize>,
}

impl Iterator for LruCandidates<'_> {
    type Item = PageId;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.index.nodes[idx];
        self.cursor = node.next;
        Some(node.page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableId;

    fn pid(no: u32) -> PageId {
        PageId::new(TableId::new(1), no)
    }

    fn order(index: &LruIndex) -> Vec<u32> {
        index.lru_candidates().map(|p| p.page_no).collect()
    }

    #[test]
    fn test_touch_inserts_at_mru_end() {
        let mut index = LruIndex::new();
        index.touch(pid(0));
        index.touch(pid(1));
        index.touch(pid(2));

        assert_eq!(index.len(), 3);
        assert_eq!(order(&index), vec![0, 1, 2]);
    }

    #[test]
    fn test_touch_moves_to_mru_end() {
        let mut index = LruIndex::new();
        index.touch(pid(0));
        index.touch(pid(1));
        index.touch(pid(2));

        index.touch(pid(0));
        assert_eq!(order(&index), vec![1, 2, 0]);

        // Touching the MRU entry changes nothing.
        index.touch(pid(0));
        assert_eq!(order(&index), vec![1, 2, 0]);
    }

    #[test]
    fn test_remove() {
        let mut index = LruIndex::new();
        index.touch(pid(0));
        index.touch(pid(1));
        index.touch(pid(2));

        index.remove(pid(1));
        assert_eq!(order(&index), vec![0, 2]);
        assert_eq!(index.len(), 2);

        // Head and tail removal.
        index.remove(pid(0));
        assert_eq!(order(&index), vec![2]);
        index.remove(pid(2));
        assert!(index.is_empty());
        assert_eq!(order(&index), Vec::<u32>::new());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut index = LruIndex::new();
        index.touch(pid(0));
        index.remove(pid(9));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut index = LruIndex::new();
        for no in 0..8 {
            index.touch(pid(no));
        }
        for no in 0..8 {
            index.remove(pid(no));
        }
        for no in 8..16 {
            index.touch(pid(no));
        }

        // The arena did not grow past the peak population.
        assert_eq!(index.nodes.len(), 8);
        assert_eq!(order(&index), (8..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_interleaved_touch_remove() {
        let mut index = LruIndex::new();
        index.touch(pid(0));
        index.touch(pid(1));
        index.touch(pid(0));
        index.remove(pid(1));
        index.touch(pid(2));
        index.touch(pid(0));

        assert_eq!(order(&index), vec![2, 0]);
    }
}
