//! StrataDB - the page layer of a single-node relational storage engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           StrataDB                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │      query operators / optimizer (external collaborators)       │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │              Buffer Pool (buffer/)                      │    │
//! │  │   bounded PageId → CachedPage map + LRU eviction        │    │
//! │  │   fetch / insert / delete / flush / complete_txn        │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │            ↓ locks                         ↓ pages              │
//! │  ┌──────────────────────────┐   ┌─────────────────────────┐     │
//! │  │ Lock Manager             │   │ Storage (storage/)      │     │
//! │  │ (concurrency/)           │   │ HeapFile + HeapPage     │     │
//! │  │ sharded S/X page locks,  │   │ bitmap header + fixed-  │     │
//! │  │ strict 2PL, timeouts     │   │ width slots, Catalog    │     │
//! │  └──────────────────────────┘   └─────────────────────────┘     │
//! │                                                                 │
//! │  statistics (stats/): histograms + scan cost, read-only         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Buffer policy
//! No-steal/no-force: a dirty page is never written to disk before its
//! transaction commits, and commit flushes exactly the pages that
//! transaction dirtied. Aborts discard in-memory dirty pages; there
//! is no write-ahead log, so crash recovery is out of scope.
//!
//! # Modules
//! - [`common`] - shared primitives (ids, errors, config)
//! - [`buffer`] - the bounded page cache and eviction
//! - [`concurrency`] - shared/exclusive page locking
//! - [`storage`] - heap files, slotted pages, tuples, the catalog
//! - [`stats`] - optimizer-facing histograms and table statistics
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use stratadb::buffer::BufferPool;
//! use stratadb::common::{TableId, TransactionId};
//! use stratadb::storage::{Catalog, Field, FieldType, HeapFile, Schema, Tuple};
//!
//! # fn main() -> stratadb::common::Result<()> {
//! let catalog = Arc::new(Catalog::new());
//! let schema = Schema::new(vec![FieldType::Int, FieldType::Text(32)]);
//! catalog.register(HeapFile::open_or_create("users.db", TableId::new(1), schema)?);
//!
//! let pool = BufferPool::new(50, catalog);
//! let txn = TransactionId::new();
//!
//! let mut tuple = Tuple::new(vec![Field::Int(1), Field::Text("ada".into())]);
//! pool.insert_tuple(txn, TableId::new(1), &mut tuple)?;
//! pool.complete_transaction(txn, true)?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod stats;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, PageId, RecordId, Result, TableId, TransactionId};

pub use buffer::{BufferPool, BufferPoolStats, CachedPage, StatsSnapshot};
pub use concurrency::{LockManager, LockMode, Permission};
pub use storage::{Catalog, Field, FieldType, HeapFile, HeapPage, Schema, TableScan, Tuple};
