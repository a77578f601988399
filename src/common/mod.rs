//! Common types and utilities shared across StrataDB.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (TableId, PageId, RecordId, TransactionId)

pub mod config;
pub mod error;
mod page_id;
mod record_id;
mod transaction_id;

pub use error::{Error, Result};
pub use page_id::{PageId, TableId};
pub use record_id::RecordId;
pub use transaction_id::TransactionId;
