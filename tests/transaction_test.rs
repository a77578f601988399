//! Transaction and locking integration tests.
//!
//! Page-level two-phase locking as seen through the buffer pool API:
//! shared/exclusive compatibility, blocking and timeout, lock release
//! at transaction completion, and multi-threaded isolation.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stratadb::buffer::BufferPool;
use stratadb::common::{Error, PageId, TableId, TransactionId};
use stratadb::concurrency::Permission;
use stratadb::storage::{Catalog, Field, FieldType, HeapFile, HeapPage, Schema, Tuple};
use tempfile::tempdir;

fn int_schema() -> Schema {
    Schema::new(vec![FieldType::Int])
}

fn make_pool(capacity: usize, pages: u32) -> (Arc<BufferPool>, TableId, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let catalog = Arc::new(Catalog::new());
    let table = TableId::new(1);

    let file = HeapFile::create(dir.path().join("t1.db"), table, int_schema()).unwrap();
    for _ in 0..pages {
        file.append_page().unwrap();
    }
    catalog.register(file);

    (Arc::new(BufferPool::new(capacity, catalog)), table, dir)
}

fn make_pool_with_timeout(
    capacity: usize,
    pages: u32,
    timeout: Duration,
) -> (Arc<BufferPool>, TableId, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let catalog = Arc::new(Catalog::new());
    let table = TableId::new(1);

    let file = HeapFile::create(dir.path().join("t1.db"), table, int_schema()).unwrap();
    for _ in 0..pages {
        file.append_page().unwrap();
    }
    catalog.register(file);

    (
        Arc::new(BufferPool::with_lock_timeout(capacity, catalog, timeout)),
        table,
        dir,
    )
}

#[test]
fn test_shared_fetches_coexist() {
    let (pool, table, _dir) = make_pool(4, 1);
    let page = PageId::new(table, 0);

    let txn1 = TransactionId::new();
    let txn2 = TransactionId::new();

    pool.fetch_page(txn1, page, Permission::ReadOnly).unwrap();
    pool.fetch_page(txn2, page, Permission::ReadOnly).unwrap();

    assert!(pool.holds_lock(txn1, page));
    assert!(pool.holds_lock(txn2, page));
}

#[test]
fn test_exclusive_fetch_times_out_against_reader() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 1, Duration::from_millis(50));
    let page = PageId::new(table, 0);

    let reader = TransactionId::new();
    pool.fetch_page(reader, page, Permission::ReadOnly).unwrap();

    let writer = TransactionId::new();
    let result = pool.fetch_page(writer, page, Permission::ReadWrite);
    assert!(matches!(result, Err(Error::LockTimeout { .. })));
    assert_eq!(pool.stats().snapshot().lock_timeouts, 1);

    // The timed-out transaction holds nothing on the page.
    assert!(!pool.holds_lock(writer, page));
}

#[test]
fn test_exclusive_fetch_unblocks_on_commit() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 1, Duration::from_secs(10));
    let page = PageId::new(table, 0);

    let reader = TransactionId::new();
    pool.fetch_page(reader, page, Permission::ReadOnly).unwrap();

    let (tx, rx) = mpsc::channel();
    let writer_pool = Arc::clone(&pool);
    let handle = thread::spawn(move || {
        let writer = TransactionId::new();
        tx.send(()).unwrap();
        writer_pool
            .fetch_page(writer, page, Permission::ReadWrite)
            .unwrap();
        writer
    });

    rx.recv().unwrap();
    thread::sleep(Duration::from_millis(50));

    // The writer is still parked behind the shared lock.
    assert!(!handle.is_finished());

    pool.complete_transaction(reader, true).unwrap();
    let writer = handle.join().unwrap();
    assert!(pool.holds_lock(writer, page));
}

#[test]
fn test_sole_reader_upgrades_in_place() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 1, Duration::from_millis(50));
    let page = PageId::new(table, 0);
    let txn = TransactionId::new();

    pool.fetch_page(txn, page, Permission::ReadOnly).unwrap();
    pool.fetch_page(txn, page, Permission::ReadWrite).unwrap();
    assert!(pool.holds_lock(txn, page));

    // The upgrade is exclusive: a second reader now times out.
    let other = TransactionId::new();
    let result = pool.fetch_page(other, page, Permission::ReadOnly);
    assert!(matches!(result, Err(Error::LockTimeout { .. })));
}

#[test]
fn test_complete_transaction_releases_every_page() {
    let (pool, table, _dir) = make_pool(4, 3);
    let txn = TransactionId::new();

    let pages: Vec<PageId> = (0..3).map(|no| PageId::new(table, no)).collect();
    for &page in &pages {
        pool.fetch_page(txn, page, Permission::ReadWrite).unwrap();
    }
    for &page in &pages {
        assert!(pool.holds_lock(txn, page));
    }

    pool.complete_transaction(txn, true).unwrap();
    for &page in &pages {
        assert!(!pool.holds_lock(txn, page));
    }
}

#[test]
fn test_release_page_lets_writer_proceed() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 2, Duration::from_millis(50));
    let page = PageId::new(table, 0);

    // A scanner examined the page but made no decision based on it.
    let scanner = TransactionId::new();
    pool.fetch_page(scanner, page, Permission::ReadOnly).unwrap();
    pool.release_page(scanner, page);

    let writer = TransactionId::new();
    pool.fetch_page(writer, page, Permission::ReadWrite).unwrap();
    assert!(pool.holds_lock(writer, page));
}

#[test]
fn test_insert_releases_full_candidate_pages() {
    // Filling a page and inserting past it: the inserter must not keep
    // a lock on the full page it skipped.
    let (pool, table, _dir) =
        make_pool_with_timeout(8, 0, Duration::from_millis(50));

    let filler = TransactionId::new();
    let slots = HeapPage::slots_per_page(&int_schema());
    for v in 0..slots as i64 {
        let mut tuple = Tuple::new(vec![Field::Int(v)]);
        pool.insert_tuple(filler, table, &mut tuple).unwrap();
    }
    pool.complete_transaction(filler, true).unwrap();

    let inserter = TransactionId::new();
    let mut tuple = Tuple::new(vec![Field::Int(-1)]);
    let touched = pool.insert_tuple(inserter, table, &mut tuple).unwrap();
    assert_eq!(touched, vec![PageId::new(table, 1)]);

    // Page 0 was examined and skipped; it is free for a writer.
    assert!(!pool.holds_lock(inserter, PageId::new(table, 0)));
    let writer = TransactionId::new();
    pool.fetch_page(writer, PageId::new(table, 0), Permission::ReadWrite)
        .unwrap();
}

#[test]
fn test_concurrent_inserters_lose_no_rows() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 0, Duration::from_secs(10));

    const THREADS: i64 = 4;
    const ROWS_PER_THREAD: i64 = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..ROWS_PER_THREAD {
                    let txn = TransactionId::new();
                    let mut tuple =
                        Tuple::new(vec![Field::Int(t * ROWS_PER_THREAD + i)]);
                    pool.insert_tuple(txn, table, &mut tuple).unwrap();
                    pool.complete_transaction(txn, true).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut values: Vec<i64> = pool
        .scan(TransactionId::new(), table)
        .unwrap()
        .map(|t| match t.unwrap().fields()[0] {
            Field::Int(v) => v,
            _ => unreachable!(),
        })
        .collect();
    values.sort();
    assert_eq!(values, (0..THREADS * ROWS_PER_THREAD).collect::<Vec<_>>());
}

#[test]
fn test_aborted_writes_invisible_to_others() {
    let (pool, table, _dir) =
        make_pool_with_timeout(4, 0, Duration::from_secs(10));

    let committed = TransactionId::new();
    let mut tuple = Tuple::new(vec![Field::Int(1)]);
    pool.insert_tuple(committed, table, &mut tuple).unwrap();
    pool.complete_transaction(committed, true).unwrap();

    let doomed_pool = Arc::clone(&pool);
    thread::spawn(move || {
        let doomed = TransactionId::new();
        let mut tuple = Tuple::new(vec![Field::Int(2)]);
        doomed_pool.insert_tuple(doomed, table, &mut tuple).unwrap();
        doomed_pool.complete_transaction(doomed, false).unwrap();
    })
    .join()
    .unwrap();

    let values: Vec<i64> = pool
        .scan(TransactionId::new(), table)
        .unwrap()
        .map(|t| match t.unwrap().fields()[0] {
            Field::Int(v) => v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(values, vec![1]);
}
