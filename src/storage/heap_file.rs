//! Heap file - one table's page-addressed backing store.
//!
//! A [`HeapFile`] stores a collection of tuples in no particular
//! order, as a flat sequence of fixed-size [`HeapPage`]s: page `k`
//! lives at byte offset `k * PAGE_SIZE`. Heap files only ever grow;
//! pages are appended at the end and never removed.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{BufferPool, CachedPage};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, RecordId, Result, TableId, TransactionId};
use crate::concurrency::Permission;
use crate::storage::heap_page::HeapPage;
use crate::storage::tuple::{Schema, Tuple};

/// One table's heap file.
///
/// # Thread Safety
/// The file handle sits behind a mutex, so `&HeapFile` can be shared
/// freely (the catalog hands out `Arc<HeapFile>`). Each read or write
/// is a whole-page operation performed under that mutex; appends hold
/// it across the length check and the extension so concurrent appends
/// get distinct page numbers.
///
/// # Durability
/// Every page write and append is followed by `fsync()`. With no
/// write-ahead log, flush-at-commit is the only persistence point this
/// crate controls, so it is conservative about it.
pub struct HeapFile {
    path: PathBuf,
    table_id: TableId,
    schema: Schema,
    file: Mutex<File>,
}

impl HeapFile {
    /// Create a new heap file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, table_id: TableId, schema: Schema) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            table_id,
            schema,
            file: Mutex::new(file),
        })
    }

    /// Open an existing heap file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, table_id: TableId, schema: Schema) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            table_id,
            schema,
            file: Mutex::new(file),
        })
    }

    /// Open an existing heap file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        table_id: TableId,
        schema: Schema,
    ) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, table_id, schema)
        } else {
            Self::create(path, table_id, schema)
        }
    }

    /// The path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The table this file backs.
    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// The schema of this table's rows.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of pages in the file: file length over the page size,
    /// rounded up.
    pub fn num_pages(&self) -> Result<u32> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok(len.div_ceil(PAGE_SIZE as u64) as u32)
    }

    /// Read page `page_no` from disk.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if `page_no` is at or past the end
    ///   of the file
    /// - `Error::Io` if the file is shorter than a whole page demands
    pub fn read_page(&self, page_no: u32) -> Result<HeapPage> {
        let mut file = self.file.lock();

        let len = file.metadata()?.len();
        let num_pages = len.div_ceil(PAGE_SIZE as u64) as u32;
        if page_no >= num_pages {
            return Err(Error::PageOutOfBounds {
                page: PageId::new(self.table_id, page_no),
                num_pages,
            });
        }

        let offset = (page_no as u64) * (PAGE_SIZE as u64);
        file.seek(SeekFrom::Start(offset))?;

        let mut data = [0u8; PAGE_SIZE];
        file.read_exact(&mut data)?;

        Ok(HeapPage::from_bytes(
            PageId::new(self.table_id, page_no),
            self.schema.clone(),
            data,
        ))
    }

    /// Write a page back to disk, always a whole-page write at the
    /// page's offset, never partial.
    ///
    /// # Durability
    /// Calls `fsync()` after writing.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let mut file = self.file.lock();

        let offset = (page.page_id().page_no as u64) * (PAGE_SIZE as u64);
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.as_bytes())?;
        file.sync_all()?;

        Ok(())
    }

    /// Atomically extend the file with one zeroed page and return the
    /// new page's number.
    pub fn append_page(&self) -> Result<u32> {
        let mut file = self.file.lock();

        let len = file.metadata()?.len();
        let page_no = (len / PAGE_SIZE as u64) as u32;

        file.seek(SeekFrom::Start(len))?;
        let zeros = [0u8; PAGE_SIZE];
        file.write_all(&zeros)?;
        file.sync_all()?;

        Ok(page_no)
    }

    /// Insert a tuple into the first page with a free slot, appending
    /// a fresh page if every existing page is full.
    ///
    /// Pages are scanned in order 0..num_pages, each fetched through
    /// the pool at ReadWrite so locking is enforced. A full candidate
    /// page is released early via [`BufferPool::release_page`]; the
    /// transaction only examined it, so holding its lock would shrink
    /// concurrency for nothing. O(num_pages) per insert is accepted;
    /// no free-list index is maintained.
    ///
    /// On success the tuple's record ID is set and the page housing it
    /// is marked dirty. Returns the pages modified (always exactly
    /// one).
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageId>> {
        self.schema.check(tuple)?;

        let num_pages = self.num_pages()?;
        for page_no in 0..num_pages {
            let page_id = PageId::new(self.table_id, page_no);
            let page = pool.fetch_page(txn, page_id, Permission::ReadWrite)?;

            let slot = {
                let mut data = page.write();
                if data.free_slot_count() == 0 {
                    None
                } else {
                    Some(data.insert_tuple(tuple)?)
                }
            };

            match slot {
                Some(slot) => {
                    page.mark_dirty(txn);
                    tuple.set_record_id(RecordId::new(page_id, slot));
                    return Ok(vec![page_id]);
                }
                None => pool.release_page(txn, page_id),
            }
        }

        // Every existing page is full: append exactly one fresh page
        // and insert there.
        let page_no = self.append_page()?;
        let page_id = PageId::new(self.table_id, page_no);
        let page = pool.fetch_page(txn, page_id, Permission::ReadWrite)?;

        let slot = page.write().insert_tuple(tuple)?;
        page.mark_dirty(txn);
        tuple.set_record_id(RecordId::new(page_id, slot));
        Ok(vec![page_id])
    }

    /// Lazily iterate this table's tuples through the pool.
    ///
    /// Pages are visited in ascending page-number order, slots in
    /// ascending order among set presence bits. Each page is fetched
    /// at ReadOnly (Shared) under `txn`, so the scan respects the
    /// locking discipline of whatever transaction drives it.
    pub fn iter<'p>(self: &Arc<Self>, pool: &'p BufferPool, txn: TransactionId) -> TableScan<'p> {
        TableScan {
            pool,
            file: Arc::clone(self),
            txn,
            page_no: 0,
            next_slot: 0,
            current: None,
            done: false,
        }
    }
}

/// Lazy tuple iterator over one table.
///
/// Finite and restartable: [`TableScan::rewind`] starts the sequence
/// again from page 0. Fetch errors (lock timeouts included) surface as
/// `Some(Err(..))` and end the scan.
pub struct TableScan<'p> {
    pool: &'p BufferPool,
    file: Arc<HeapFile>,
    txn: TransactionId,
    page_no: u32,
    next_slot: usize,
    current: Option<Arc<CachedPage>>,
    done: bool,
}

impl TableScan<'_> {
    /// The transaction driving this scan.
    #[inline]
    pub fn txn(&self) -> TransactionId {
        self.txn
    }

    /// Restart the scan from page 0.
    pub fn rewind(&mut self) {
        self.page_no = 0;
        self.next_slot = 0;
        self.current = None;
        self.done = false;
    }

    fn fail(&mut self, err: Error) -> Option<Result<Tuple>> {
        self.done = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for TableScan<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let page = match &self.current {
                Some(page) => Arc::clone(page),
                None => {
                    let num_pages = match self.file.num_pages() {
                        Ok(n) => n,
                        Err(e) => return self.fail(e),
                    };
                    if self.page_no >= num_pages {
                        self.done = true;
                        return None;
                    }
                    let page_id = PageId::new(self.file.table_id(), self.page_no);
                    let page = match self.pool.fetch_page(self.txn, page_id, Permission::ReadOnly)
                    {
                        Ok(page) => page,
                        Err(e) => return self.fail(e),
                    };
                    self.next_slot = 0;
                    self.current = Some(Arc::clone(&page));
                    page
                }
            };

            let data = page.read();
            while self.next_slot < data.slot_count() {
                let slot = self.next_slot;
                self.next_slot += 1;
                if data.is_slot_used(slot) {
                    return Some(data.tuple_at(slot));
                }
            }
            drop(data);

            // Page exhausted, move on.
            self.current = None;
            self.page_no += 1;
        }
    }
}
