//! Per-table statistics for scan-cost and selectivity estimation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::BufferPool;
use crate::common::config::{DEFAULT_IO_COST_PER_PAGE, HIST_BINS};
use crate::common::{Error, Result, TableId, TransactionId};
use crate::stats::histogram::{IntHistogram, PredicateOp};
use crate::storage::{Field, FieldType};

/// Statistics about one base table: page count, tuple count, and one
/// histogram per integer column.
///
/// Built from a full Shared-mode scan through the buffer pool, so the
/// build respects the locking discipline of the transaction driving
/// it. The consumer is the cost-based optimizer, which is read-only
/// with respect to the storage core.
pub struct TableStats {
    table: TableId,
    io_cost_per_page: f64,
    num_pages: u32,
    total_tuples: u64,
    /// Field index → histogram, for Int columns only.
    histograms: HashMap<usize, IntHistogram>,
}

impl TableStats {
    /// Scan `table` under `txn` and build its statistics.
    ///
    /// One pass collects every integer value per column (tracking
    /// min/max as it goes); the histograms are then filled with
    /// [`HIST_BINS`] buckets each. Text columns get no histogram.
    pub fn build(
        pool: &BufferPool,
        txn: TransactionId,
        table: TableId,
        io_cost_per_page: f64,
    ) -> Result<Self> {
        let file = pool
            .catalog()
            .table(table)
            .ok_or(Error::UnknownTable(table))?;
        let schema = file.schema().clone();
        let num_pages = file.num_pages()?;

        let int_fields: Vec<usize> = schema
            .field_types()
            .enumerate()
            .filter(|(_, ty)| *ty == FieldType::Int)
            .map(|(i, _)| i)
            .collect();

        let mut values: HashMap<usize, Vec<i64>> =
            int_fields.iter().map(|&i| (i, Vec::new())).collect();
        let mut total_tuples = 0u64;

        for tuple in pool.scan(txn, table)? {
            let tuple = tuple?;
            total_tuples += 1;
            for &i in &int_fields {
                if let (Some(Field::Int(v)), Some(vs)) = (tuple.field(i), values.get_mut(&i)) {
                    vs.push(*v);
                }
            }
        }

        let mut histograms = HashMap::new();
        for (i, vs) in values {
            let (Some(&min), Some(&max)) = (vs.iter().min(), vs.iter().max()) else {
                continue; // empty table: no histogram for this column
            };
            let mut hist = IntHistogram::new(HIST_BINS, min, max);
            for v in vs {
                hist.add_value(v);
            }
            histograms.insert(i, hist);
        }

        Ok(TableStats {
            table,
            io_cost_per_page,
            num_pages,
            total_tuples,
            histograms,
        })
    }

    /// The table these statistics describe.
    #[inline]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Estimated cost of sequentially scanning the whole table:
    /// `io_cost_per_page * num_pages`. The last page costs as much as
    /// a full one, and no page is assumed cached.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.io_cost_per_page * self.num_pages as f64
    }

    /// Estimated number of tuples a predicate with the given
    /// selectivity leaves: `floor(selectivity * total_tuples)`.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (selectivity * self.total_tuples as f64) as u64
    }

    /// Estimate the selectivity of `field op constant` on this table.
    ///
    /// Columns without a histogram (Text columns, or any column of an
    /// empty table) fall back to 1.0: no information, assume nothing
    /// is filtered.
    pub fn estimate_selectivity(&self, field: usize, op: PredicateOp, constant: &Field) -> f64 {
        match (self.histograms.get(&field), constant) {
            (Some(hist), Field::Int(v)) => hist.estimate_selectivity(op, *v),
            _ => 1.0,
        }
    }

    /// Total number of tuples in the table at build time.
    #[inline]
    pub fn total_tuples(&self) -> u64 {
        self.total_tuples
    }
}

/// Statistics registry scoped to one open database.
///
/// An explicit object handed to the components that need it; there
/// is no process-wide statistics map.
pub struct StatsCatalog {
    io_cost_per_page: f64,
    stats: RwLock<HashMap<TableId, Arc<TableStats>>>,
}

impl Default for StatsCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCatalog {
    /// Create a registry with the default per-page I/O cost.
    pub fn new() -> Self {
        Self::with_io_cost(DEFAULT_IO_COST_PER_PAGE)
    }

    /// Create a registry with an explicit per-page I/O cost, used for
    /// every statistics build it performs.
    pub fn with_io_cost(io_cost_per_page: f64) -> Self {
        StatsCatalog {
            io_cost_per_page,
            stats: RwLock::new(HashMap::new()),
        }
    }

    /// Store statistics for a table, replacing any previous ones.
    pub fn set(&self, stats: TableStats) {
        self.stats.write().insert(stats.table(), Arc::new(stats));
    }

    /// Fetch a table's statistics, if computed.
    pub fn get(&self, table: TableId) -> Option<Arc<TableStats>> {
        self.stats.read().get(&table).cloned()
    }

    /// Build statistics for every table registered in the pool's
    /// catalog, scanning each under `txn`.
    pub fn compute_all(&self, pool: &BufferPool, txn: TransactionId) -> Result<()> {
        for table in pool.catalog().table_ids() {
            let stats = TableStats::build(pool, txn, table, self.io_cost_per_page)?;
            self.set(stats);
        }
        Ok(())
    }
}
