//! Lock manager - per-page shared/exclusive locking.
//!
//! Implements strict two-phase locking at page granularity: a
//! transaction acquires locks as it touches pages and holds them until
//! [`LockManager::complete_transaction`] releases everything at once.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::common::config::LOCK_SHARD_COUNT;
use crate::common::{Error, PageId, Result, TransactionId};

/// Lock mode on a page.
///
/// At any instant a page is held either by any number of Shared
/// holders or by exactly one Exclusive holder, never both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Read-sharable: any number of transactions may hold it together.
    Shared,
    /// Single-writer: no other holder of any kind may coexist.
    Exclusive,
}

/// Access level requested when fetching a page. Maps onto the lock
/// mode the buffer pool acquires before serving the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    /// The lock mode this permission requires.
    #[inline]
    pub fn lock_mode(self) -> LockMode {
        match self {
            Permission::ReadOnly => LockMode::Shared,
            Permission::ReadWrite => LockMode::Exclusive,
        }
    }
}

/// Who holds a page right now.
///
/// The never-mixed invariant is structural: a page is either shared by
/// a set of transactions or owned exclusively by one.
enum LockState {
    Shared(HashSet<TransactionId>),
    Exclusive(TransactionId),
}

/// One shard of the lock table: a slice of the page space plus the
/// condvar its waiters sleep on. Releases in the shard wake every
/// waiter so blocked acquisitions re-check their grant condition.
struct Shard {
    table: Mutex<HashMap<PageId, LockState>>,
    released: Condvar,
}

impl Shard {
    fn new() -> Self {
        Shard {
            table: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }
}

/// Per-page lock table, sharded by page identity.
///
/// # State machine per page
/// ```text
/// Unlocked ──acquire(S)──▶ Shared(1) ──acquire(S), new txn──▶ Shared(n)
/// Unlocked ──acquire(X)──▶ Exclusive
/// Shared(1) ──acquire(X), sole holder──▶ Exclusive   (upgrade)
/// Shared(n>1) / Exclusive ──acquire by other txn──▶ refused
/// ```
/// A request already satisfied by an existing grant at an
/// equal-or-stronger mode is a no-op success.
///
/// # Waiting
/// [`LockManager::acquire`] blocks on the shard's condvar, woken on
/// every release in the shard, until granted or its deadline passes.
/// There is no cycle-based deadlock detection: all deadlocks resolve
/// indirectly by timeout, which the caller treats as an abort signal.
pub struct LockManager {
    shards: Vec<Shard>,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager {
    /// Create a lock manager with the default shard count.
    pub fn new() -> Self {
        LockManager {
            shards: (0..LOCK_SHARD_COUNT).map(|_| Shard::new()).collect(),
        }
    }

    fn shard(&self, page_id: PageId) -> &Shard {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        page_id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) & (self.shards.len() - 1)]
    }

    /// Decide one acquisition attempt against the current table state.
    /// Mutates the table on success.
    fn grant(
        table: &mut HashMap<PageId, LockState>,
        page_id: PageId,
        txn: TransactionId,
        mode: LockMode,
    ) -> bool {
        match table.get_mut(&page_id) {
            None => {
                let state = match mode {
                    LockMode::Shared => LockState::Shared(HashSet::from([txn])),
                    LockMode::Exclusive => LockState::Exclusive(txn),
                };
                table.insert(page_id, state);
                true
            }
            Some(LockState::Shared(holders)) => match mode {
                LockMode::Shared => {
                    holders.insert(txn);
                    true
                }
                LockMode::Exclusive => {
                    // Upgrade succeeds only for the sole sharer.
                    if holders.len() == 1 && holders.contains(&txn) {
                        table.insert(page_id, LockState::Exclusive(txn));
                        true
                    } else {
                        false
                    }
                }
            },
            // An Exclusive holder already satisfies any re-request by
            // itself; everyone else is refused.
            Some(LockState::Exclusive(owner)) => *owner == txn,
        }
    }

    /// Try to acquire the lock without waiting.
    ///
    /// Returns `true` if the lock was granted (or was already held at
    /// an equal-or-stronger mode), `false` on conflict.
    pub fn try_acquire(&self, page_id: PageId, txn: TransactionId, mode: LockMode) -> bool {
        let shard = self.shard(page_id);
        let mut table = shard.table.lock();
        Self::grant(&mut table, page_id, txn, mode)
    }

    /// Acquire the lock, waiting up to `timeout` for conflicting
    /// holders to release.
    ///
    /// # Errors
    /// Returns `Error::LockTimeout` if the deadline passes first.
    pub fn acquire(
        &self,
        page_id: PageId,
        txn: TransactionId,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let shard = self.shard(page_id);
        let mut table = shard.table.lock();

        loop {
            if Self::grant(&mut table, page_id, txn, mode) {
                return Ok(());
            }
            if shard.released.wait_until(&mut table, deadline).timed_out() {
                // A release may have raced the deadline.
                if Self::grant(&mut table, page_id, txn, mode) {
                    return Ok(());
                }
                return Err(Error::LockTimeout { page: page_id, txn });
            }
        }
    }

    /// Release `txn`'s lock on one page. No-op if it holds none.
    ///
    /// Wakes the shard's waiters so blocked acquisitions can retry.
    pub fn release(&self, page_id: PageId, txn: TransactionId) {
        let shard = self.shard(page_id);
        {
            let mut table = shard.table.lock();
            match table.get_mut(&page_id) {
                Some(LockState::Shared(holders)) => {
                    holders.remove(&txn);
                    if holders.is_empty() {
                        table.remove(&page_id);
                    }
                }
                Some(LockState::Exclusive(owner)) if *owner == txn => {
                    table.remove(&page_id);
                }
                _ => return,
            }
        }
        shard.released.notify_all();
    }

    /// Whether `txn` holds a lock (of either mode) on `page_id`.
    pub fn holds_lock(&self, page_id: PageId, txn: TransactionId) -> bool {
        let table = self.shard(page_id).table.lock();
        match table.get(&page_id) {
            Some(LockState::Shared(holders)) => holders.contains(&txn),
            Some(LockState::Exclusive(owner)) => *owner == txn,
            None => false,
        }
    }

    /// Release every lock `txn` holds, across all pages, atomically.
    ///
    /// Every shard mutex is held (acquired in index order) while the
    /// transaction is stripped, so no concurrent acquirer observes a
    /// partially-released set.
    pub fn complete_transaction(&self, txn: TransactionId) {
        let mut guards: Vec<_> = self.shards.iter().map(|s| s.table.lock()).collect();
        for table in guards.iter_mut() {
            table.retain(|_, state| match state {
                LockState::Shared(holders) => {
                    holders.remove(&txn);
                    !holders.is_empty()
                }
                LockState::Exclusive(owner) => *owner != txn,
            });
        }
        drop(guards);

        for shard in &self.shards {
            shard.released.notify_all();
        }
    }

    /// Number of pages with at least one lock entry. Test hook.
    #[cfg(test)]
    fn locked_page_count(&self) -> usize {
        self.shards.iter().map(|s| s.table.lock().len()).sum()
    }
}
