//! Configuration constants for StrataDB.

use std::time::Duration;

/// Size of a page in bytes (4KB).
///
/// This value is chosen to match:
/// - OS page size on most systems (4096 bytes)
/// - Common database page sizes (PostgreSQL uses 8KB, but 4KB is also standard)
///
/// # Page Layout
/// A heap page holds a presence bitmap (one bit per slot) followed by
/// fixed-width tuple slots:
/// - `slots_per_page = floor(PAGE_SIZE * 8 / (row_bytes * 8 + 1))`
/// - `header_bytes = ceil(slots_per_page / 8)`
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool may hold.
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Default budget a transaction waits for a page lock before the
/// request fails with a lock timeout.
///
/// Exceeding this budget is surfaced as an abort signal: the caller is
/// expected to abort the whole transaction and retry it.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Number of independent shards in the lock table.
///
/// Pages hash to shards, so acquisitions on unrelated pages proceed
/// without contending on a single mutex. Power of two so the shard can
/// be selected with a mask.
pub const LOCK_SHARD_COUNT: usize = 16;

/// Number of buckets in a fixed-width column histogram.
pub const HIST_BINS: usize = 100;

/// Default cost of reading one page during a sequential scan.
///
/// This does not differentiate between sequential-scan I/O and disk
/// seeks; the last page of a table costs as much as a full one.
pub const DEFAULT_IO_COST_PER_PAGE: f64 = 1000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_shard_count_is_power_of_two() {
        assert!(LOCK_SHARD_COUNT.is_power_of_two());
    }

    #[test]
    fn test_lock_timeout_nonzero() {
        assert!(DEFAULT_LOCK_TIMEOUT > Duration::ZERO);
    }
}
