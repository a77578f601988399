//! Cached page - a heap page resident in the buffer pool.

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, TransactionId};
use crate::storage::HeapPage;

/// A page held in the buffer pool.
///
/// # Thread Safety
/// All fields use interior mutability so the pool can hand out shared
/// `Arc<CachedPage>` handles:
/// - `data`: `RwLock` for page-content synchronization. Content
///   mutation is additionally serialized by the single-writer
///   guarantee of Exclusive-mode fetch.
/// - `dirtied_by`: `Mutex` around the dirty marker.
///
/// # Dirty Tracking
/// The dirty flag remembers *which* transaction dirtied the page, not
/// just that it is dirty. Commit flushes exactly the pages its
/// transaction dirtied; abort discards them. Under strict 2PL only one
/// transaction can have an Exclusive lock (and thus be mutating the
/// page) at a time, so a single owner is enough.
pub struct CachedPage {
    page_id: PageId,
    data: RwLock<HeapPage>,
    dirtied_by: Mutex<Option<TransactionId>>,
}

impl CachedPage {
    /// Wrap a freshly loaded heap page. Starts clean.
    pub fn new(page: HeapPage) -> Self {
        CachedPage {
            page_id: page.page_id(),
            data: RwLock::new(page),
            dirtied_by: Mutex::new(None),
        }
    }

    /// The identity of the page this entry caches.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Acquire read access to the page content.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, HeapPage> {
        self.data.read()
    }

    /// Acquire write access to the page content.
    ///
    /// Callers must hold the page's Exclusive lock and mark the page
    /// dirty after mutating it.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, HeapPage> {
        self.data.write()
    }

    /// Record that `txn` modified this page.
    #[inline]
    pub fn mark_dirty(&self, txn: TransactionId) {
        *self.dirtied_by.lock() = Some(txn);
    }

    /// Clear the dirty marker. Called after a flush.
    #[inline]
    pub fn clear_dirty(&self) {
        *self.dirtied_by.lock() = None;
    }

    /// Whether the in-memory content differs from the disk image.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.lock().is_some()
    }

    /// The transaction that dirtied this page, if any.
    #[inline]
    pub fn dirtier(&self) -> Option<TransactionId> {
        *self.dirtied_by.lock()
    }
}
