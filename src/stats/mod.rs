//! Table statistics for the cost-based optimizer.
//!
//! Consumes only read-only scan iteration from the storage core:
//! - [`IntHistogram`] - fixed-width histogram over one integer column
//! - [`TableStats`] - per-table scan cost and selectivity estimates
//! - [`StatsCatalog`] - explicit, database-scoped statistics registry

mod histogram;
mod table_stats;

pub use histogram::{IntHistogram, PredicateOp};
pub use table_stats::{StatsCatalog, TableStats};
