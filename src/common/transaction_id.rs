//! Transaction identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque token identifying a transaction.
///
/// A `TransactionId` carries no state of its own: every per-transaction
/// fact (which locks it holds, which pages it dirtied) is tracked by
/// the lock manager and the buffer pool. IDs are minted from a
/// process-wide atomic counter, so each call to [`TransactionId::new`]
/// yields a distinct token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(0);

impl TransactionId {
    /// Mint a fresh transaction ID.
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric ID.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}
