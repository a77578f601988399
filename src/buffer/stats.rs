//! Counters for the observable events of the page engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Event counters kept by the buffer pool: cache traffic, disk I/O,
/// and transaction outcomes.
///
/// The pool reports events through the `record_*` methods. Every
/// counter is a relaxed atomic, so concurrent transactions bump them
/// without taking a lock; a [`StatsSnapshot`] is therefore only
/// eventually consistent across counters, which is fine for
/// monitoring output.
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    pages_read: AtomicU64,
    pages_written: AtomicU64,
    lock_timeouts: AtomicU64,
    commits: AtomicU64,
    aborts: AtomicU64,
    discarded_pages: AtomicU64,
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetched page was already resident.
    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetched page had to come from its heap file.
    #[inline]
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A clean page was dropped to make room.
    #[inline]
    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// One whole page read from disk.
    #[inline]
    pub(crate) fn record_page_read(&self) {
        self.pages_read.fetch_add(1, Ordering::Relaxed);
    }

    /// One whole page written to disk.
    #[inline]
    pub(crate) fn record_page_write(&self) {
        self.pages_written.fetch_add(1, Ordering::Relaxed);
    }

    /// A page lock was not granted within its wait budget.
    #[inline]
    pub(crate) fn record_lock_timeout(&self) {
        self.lock_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// A transaction committed (its dirty pages were flushed).
    #[inline]
    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// A transaction aborted, throwing away `discarded` dirty pages.
    #[inline]
    pub(crate) fn record_abort(&self, discarded: u64) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
        self.discarded_pages.fetch_add(discarded, Ordering::Relaxed);
    }

    /// Copy every counter into a plain, comparable value.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            discarded_pages: self.discarded_pages.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter, e.g. between benchmark phases.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.pages_read,
            &self.pages_written,
            &self.lock_timeouts,
            &self.commits,
            &self.aborts,
            &self.discarded_pages,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// One point-in-time reading of [`BufferPoolStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
    pub lock_timeouts: u64,
    pub commits: u64,
    pub aborts: u64,
    /// Dirty pages thrown away by aborting transactions.
    pub discarded_pages: u64,
}

impl StatsSnapshot {
    /// Fraction of fetches served from the cache, 0.0 with no traffic.
    pub fn hit_rate(&self) -> f64 {
        let fetches = self.cache_hits + self.cache_misses;
        if fetches == 0 {
            0.0
        } else {
            self.cache_hits as f64 / fetches as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache: {} hits / {} misses ({:.1}%), {} evicted | \
             io: {} pages read, {} written | \
             txns: {} committed, {} aborted ({} pages discarded), {} lock timeouts",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.commits,
            self.aborts,
            self.discarded_pages,
            self.lock_timeouts,
        )
    }
}
