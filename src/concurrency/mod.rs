//! Concurrency control - page locking for transaction isolation.
//!
//! - [`LockManager`] - sharded shared/exclusive page lock table
//! - [`LockMode`] / [`Permission`] - access modes and the permission
//!   level callers request pages at

mod lock_manager;

pub use lock_manager::{LockManager, LockMode, Permission};
