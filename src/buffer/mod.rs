//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between query
//! operators and disk. It serves pages under transaction locks and
//! evicts least-recently-used clean pages when full.
//!
//! # Components
//! - [`BufferPool`] - the bounded page cache
//! - [`CachedPage`] - one resident page plus its dirty marker
//! - [`LruIndex`] - recency order over cached pages
//! - [`BufferPoolStats`] - performance statistics

mod buffer_pool;
mod cached_page;
mod lru;
mod stats;

pub use buffer_pool::BufferPool;
pub use cached_page::CachedPage;
pub use lru::LruIndex;
pub use stats::{BufferPoolStats, StatsSnapshot};
