//! Buffer pool - the single point of access to pages.
//!
//! The [`BufferPool`] enforces the capacity bound, transaction
//! isolation (via the lock manager), and the durability policy:
//! no-steal/no-force. Dirty pages are never written before their
//! transaction commits (no-steal), and they are flushed at commit
//! rather than immediately (no-force). Correctness depends on never
//! flushing a dirty page early: there is no write-ahead log to undo
//! from, so an abort simply discards the in-memory dirty pages.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::buffer::{BufferPoolStats, CachedPage, LruIndex};
use crate::common::config::DEFAULT_LOCK_TIMEOUT;
use crate::common::{Error, PageId, Result, TableId, TransactionId};
use crate::concurrency::{LockManager, Permission};
use crate::storage::{Catalog, TableScan, Tuple};

/// Cache state mutated under one coarse mutex per call: the page map
/// and the recency index always change together.
struct PoolInner {
    pages: HashMap<PageId, Arc<CachedPage>>,
    recency: LruIndex,
}

/// Bounded in-memory cache of disk pages with eviction.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        BufferPool                           │
/// │  ┌────────────────────────────┐  ┌───────────────────────┐  │
/// │  │ inner (Mutex)              │  │ lock_manager          │  │
/// │  │  pages: PageId → Arc<..>   │  │  sharded S/X table    │  │
/// │  │  recency: LruIndex         │  │  + condvar waiting    │  │
/// │  └────────────────────────────┘  └───────────────────────┘  │
/// │  ┌────────────────────────────┐  ┌───────────────────────┐  │
/// │  │ catalog: Arc<Catalog>      │  │ stats (atomics)       │  │
/// │  │  TableId → HeapFile        │  │                       │  │
/// │  └────────────────────────────┘  └───────────────────────┘  │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Locking discipline
/// Every fetch first acquires the page's lock at the requested
/// permission (possibly blocking, bounded by the pool's lock timeout)
/// and only then touches the cache. Locks are held until
/// [`BufferPool::complete_transaction`]: strict two-phase locking,
/// with [`BufferPool::release_page`] as the one documented escape.
///
/// # Eviction
/// When a miss would push the cache past capacity, the pool scans the
/// recency index from least- toward most-recently-used for the first
/// *clean* entry and drops it. Any clean page may be sacrificed, not
/// only the strict LRU one: dirty pages hold uncommitted work that no
/// log could recover. If every cached page is dirty the fetch fails
/// with [`Error::CapacityExhausted`], which the caller's transaction
/// coordinator treats as an abort signal. Since victims are always
/// clean, eviction never writes to disk.
pub struct BufferPool {
    inner: Mutex<PoolInner>,

    /// Per-page shared/exclusive lock table.
    lock_manager: LockManager,

    /// Table registry used to load and flush pages.
    catalog: Arc<Catalog>,

    /// Wait budget for a single lock acquisition.
    lock_timeout: Duration,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Maximum number of cached pages (immutable after construction).
    capacity: usize,
}

impl BufferPool {
    /// Create a buffer pool with the default lock timeout.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self::with_lock_timeout(capacity, catalog, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a buffer pool with an explicit lock timeout; the
    /// deadlock/liveness budget transactions wait before a lock
    /// request fails.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn with_lock_timeout(
        capacity: usize,
        catalog: Arc<Catalog>,
        lock_timeout: Duration,
    ) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            inner: Mutex::new(PoolInner {
                pages: HashMap::with_capacity(capacity),
                recency: LruIndex::new(),
            }),
            lock_manager: LockManager::new(),
            catalog,
            lock_timeout,
            stats: BufferPoolStats::new(),
            capacity,
        }
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page under `txn` at the given permission.
    ///
    /// Acquires the page lock first (blocking up to the pool's lock
    /// timeout), then serves the page from cache or loads it from the
    /// table's heap file, evicting a clean victim if the cache is at
    /// capacity.
    ///
    /// On failure after the lock was granted (capacity, I/O) the lock
    /// is kept: strict 2PL offers no safe early release for a page the
    /// transaction may already depend on. Callers abort, and
    /// [`BufferPool::complete_transaction`] reclaims everything.
    ///
    /// # Errors
    /// - `Error::LockTimeout` if the lock wasn't obtained in time
    /// - `Error::CapacityExhausted` if every cached page is dirty
    /// - `Error::UnknownTable` / `Error::PageOutOfBounds` / `Error::Io`
    ///   from the load path
    pub fn fetch_page(
        &self,
        txn: TransactionId,
        page_id: PageId,
        perm: Permission,
    ) -> Result<Arc<CachedPage>> {
        if let Err(e) =
            self.lock_manager
                .acquire(page_id, txn, perm.lock_mode(), self.lock_timeout)
        {
            if matches!(e, Error::LockTimeout { .. }) {
                self.stats.record_lock_timeout();
            }
            return Err(e);
        }

        let mut inner = self.inner.lock();

        if let Some(page) = inner.pages.get(&page_id).cloned() {
            inner.recency.touch(page_id);
            self.stats.record_hit();
            return Ok(page);
        }

        self.stats.record_miss();

        let file = self
            .catalog
            .table(page_id.table)
            .ok_or(Error::UnknownTable(page_id.table))?;

        if inner.pages.len() >= self.capacity {
            self.evict_one(&mut inner)?;
        }

        let heap = file.read_page(page_id.page_no)?;
        self.stats.record_page_read();

        let page = Arc::new(CachedPage::new(heap));
        inner.pages.insert(page_id, Arc::clone(&page));
        inner.recency.touch(page_id);
        Ok(page)
    }

    /// Pick and drop a clean victim, least-recently-used first.
    ///
    /// The decision is a pure scan over the recency index plus dirty
    /// flags; the removal happens here, explicitly, after the scan;
    /// no side effects fire from inside the index itself. Victims are
    /// clean by construction, so nothing is flushed.
    fn evict_one(&self, inner: &mut PoolInner) -> Result<()> {
        let victim = inner
            .recency
            .lru_candidates()
            .find(|pid| inner.pages.get(pid).is_some_and(|page| !page.is_dirty()));

        match victim {
            Some(pid) => {
                inner.pages.remove(&pid);
                inner.recency.remove(pid);
                self.stats.record_eviction();
                Ok(())
            }
            None => Err(Error::CapacityExhausted),
        }
    }

    // ========================================================================
    // Public API: Tuple mutation
    // ========================================================================

    /// Insert a tuple into `table` on behalf of `txn`.
    ///
    /// Delegates to the heap file's first-fit insertion; every
    /// candidate page is fetched through [`BufferPool::fetch_page`] at
    /// ReadWrite, and the page housing the new tuple is marked dirty.
    /// The tuple's record ID is set on success.
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        table: TableId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageId>> {
        let file = self
            .catalog
            .table(table)
            .ok_or(Error::UnknownTable(table))?;
        file.insert_tuple(self, txn, tuple)
    }

    /// Delete a tuple on behalf of `txn`, resolving it by record ID.
    ///
    /// Fetches the housing page at ReadWrite, clears the presence bit,
    /// and marks the page dirty. Returns the affected page.
    ///
    /// # Errors
    /// - `Error::NoRecordId` if the tuple was never stored
    /// - `Error::RecordNotFound` if the slot is not occupied
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> Result<PageId> {
        let rid = tuple.record_id().ok_or(Error::NoRecordId)?;

        let page = self.fetch_page(txn, rid.page_id, Permission::ReadWrite)?;
        page.write().delete_tuple(rid.slot)?;
        page.mark_dirty(txn);
        Ok(rid.page_id)
    }

    /// Lazily scan `table`'s tuples under `txn` at Shared access.
    pub fn scan(&self, txn: TransactionId, table: TableId) -> Result<TableScan<'_>> {
        let file = self
            .catalog
            .table(table)
            .ok_or(Error::UnknownTable(table))?;
        Ok(file.iter(self, txn))
    }

    // ========================================================================
    // Public API: Locks
    // ========================================================================

    /// Release `txn`'s lock on a single page before the transaction
    /// completes.
    ///
    /// This is a controlled exception to strict two-phase locking,
    /// meant only for pages the transaction merely examined, e.g. the
    /// full candidate pages of an insert scan, or non-conflicting read
    /// scans. Releasing a page the transaction read or wrote breaks
    /// isolation.
    pub fn release_page(&self, txn: TransactionId, page_id: PageId) {
        self.lock_manager.release(page_id, txn);
    }

    /// Whether `txn` holds a lock on `page_id`.
    pub fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(page_id, txn)
    }

    // ========================================================================
    // Public API: Flush and discard
    // ========================================================================

    /// Write a page's current bytes to its heap file if dirty, then
    /// clear the dirty flag. No-op for clean or uncached pages.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let page = self.inner.lock().pages.get(&page_id).cloned();
        match page {
            Some(page) => self.flush_cached(&page),
            None => Ok(()),
        }
    }

    /// Flush every dirty page in the cache.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages: Vec<Arc<CachedPage>> = self.inner.lock().pages.values().cloned().collect();
        for page in pages {
            self.flush_cached(&page)?;
        }
        Ok(())
    }

    /// Flush exactly the pages dirtied by `txn`. Called at commit.
    pub fn flush_pages(&self, txn: TransactionId) -> Result<()> {
        let pages: Vec<Arc<CachedPage>> = {
            let inner = self.inner.lock();
            inner
                .pages
                .values()
                .filter(|page| page.dirtier() == Some(txn))
                .cloned()
                .collect()
        };
        for page in pages {
            self.flush_cached(&page)?;
        }
        Ok(())
    }

    /// Remove a page from the cache without flushing it. Used on
    /// abort: the next fetch reloads the last-flushed disk image.
    pub fn discard_page(&self, page_id: PageId) {
        let mut inner = self.inner.lock();
        inner.pages.remove(&page_id);
        inner.recency.remove(page_id);
    }

    fn flush_cached(&self, page: &CachedPage) -> Result<()> {
        if !page.is_dirty() {
            return Ok(());
        }

        let table = page.page_id().table;
        let file = self.catalog.table(table).ok_or(Error::UnknownTable(table))?;

        {
            let data = page.read();
            file.write_page(&data)?;
        }
        page.clear_dirty();
        self.stats.record_page_write();
        Ok(())
    }

    // ========================================================================
    // Public API: Transaction completion
    // ========================================================================

    /// Finish `txn`, committing or aborting.
    ///
    /// Commit flushes every page the transaction dirtied; abort
    /// discards them so their in-memory state reverts to the
    /// last-flushed disk image on the next fetch. Either way, every
    /// lock the transaction holds is then released in one atomic step.
    pub fn complete_transaction(&self, txn: TransactionId, commit: bool) -> Result<()> {
        if commit {
            self.flush_pages(txn)?;
            self.stats.record_commit();
        } else {
            let mut inner = self.inner.lock();
            let dirtied: Vec<PageId> = inner
                .pages
                .values()
                .filter(|page| page.dirtier() == Some(txn))
                .map(|page| page.page_id())
                .collect();
            let discarded = dirtied.len() as u64;
            for pid in dirtied {
                inner.pages.remove(&pid);
                inner.recency.remove(pid);
            }
            drop(inner);
            self.stats.record_abort(discarded);
        }

        self.lock_manager.complete_transaction(txn);
        Ok(())
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Maximum number of pages this pool may cache.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached.
    pub fn cached_page_count(&self) -> usize {
        self.inner.lock().pages.len()
    }

    /// Whether `page_id` is currently cached. Test and tooling hook;
    /// does not count as a use for recency purposes.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.inner.lock().pages.contains_key(&page_id)
    }

    /// The catalog this pool loads and flushes pages through.
    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Buffer pool statistics.
    #[inline]
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }
}
