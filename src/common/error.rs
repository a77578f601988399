//! Error types for StrataDB.

use thiserror::Error;

use crate::common::{PageId, RecordId, TableId, TransactionId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write
/// `Result<T>`, like `std::io::Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in StrataDB.
///
/// Lock errors are the only kind higher layers are expected to handle
/// routinely (by aborting and retrying the whole transaction). Storage
/// and capacity errors are unrecoverable for the current operation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The buffer pool is full and every cached page is dirty.
    ///
    /// With no write-ahead log, a dirty page cannot be evicted before
    /// its transaction commits, so the fetch fails. Not retryable
    /// until a commit or abort elsewhere frees capacity.
    #[error("buffer pool is full and no clean page can be evicted")]
    CapacityExhausted,

    /// A page lock was not obtained within the wait budget.
    ///
    /// Surfaced to the caller as an abort signal; the engine performs
    /// no automatic retry at this layer.
    #[error("{txn} timed out waiting for a lock on {page}")]
    LockTimeout { page: PageId, txn: TransactionId },

    /// A delete/update referenced a slot that is not occupied.
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    /// The table is not registered in the catalog.
    #[error("unknown table {0}")]
    UnknownTable(TableId),

    /// A tuple's shape disagrees with the table's schema.
    #[error("tuple does not match the table schema")]
    SchemaMismatch,

    /// A page number at or past the end of the heap file was requested.
    #[error("{page} is out of bounds (file has {num_pages} pages)")]
    PageOutOfBounds { page: PageId, num_pages: u32 },

    /// A page-level insert was attempted on a page with no free slot.
    ///
    /// The file layer checks for free slots before inserting, so
    /// seeing this indicates a misuse of the page API.
    #[error("{0} has no free slot")]
    PageFull(PageId),

    /// A tuple that was never stored (no record ID) was passed to an
    /// operation that needs to locate it.
    #[error("tuple has not been stored and carries no record id")]
    NoRecordId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableId;

    #[test]
    fn test_error_display() {
        let err = Error::CapacityExhausted;
        assert_eq!(
            format!("{}", err),
            "buffer pool is full and no clean page can be evicted"
        );

        let err = Error::UnknownTable(TableId::new(9));
        assert_eq!(format!("{}", err), "unknown table Table(9)");
    }

    #[test]
    fn test_record_not_found_display() {
        let rid = RecordId::new(PageId::new(TableId::new(1), 0), 2);
        assert_eq!(
            format!("{}", Error::RecordNotFound(rid)),
            "record Page(1.0)[2] not found"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: Error = io_err.into();
        assert!(err.source().is_some());
    }
}
