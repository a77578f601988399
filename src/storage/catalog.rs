//! Catalog - the table registry.
//!
//! An explicit object rather than a process-wide global: one catalog
//! per open database, shared via `Arc` by the buffer pool and the
//! statistics layer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::TableId;
use crate::storage::heap_file::HeapFile;
use crate::storage::tuple::Schema;

/// Registry mapping table identity to its heap file and schema.
///
/// Loading the catalog (parsing a schema file, assigning table IDs) is
/// out of scope; callers register already-opened [`HeapFile`]s.
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, Arc<HeapFile>>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table's heap file, replacing any previous file with
    /// the same table ID. Returns the shared handle.
    pub fn register(&self, file: HeapFile) -> Arc<HeapFile> {
        let file = Arc::new(file);
        self.tables
            .write()
            .insert(file.table_id(), Arc::clone(&file));
        file
    }

    /// Look up a table's heap file.
    pub fn table(&self, table_id: TableId) -> Option<Arc<HeapFile>> {
        self.tables.read().get(&table_id).cloned()
    }

    /// Look up a table's column schema.
    pub fn schema(&self, table_id: TableId) -> Option<Schema> {
        self.tables
            .read()
            .get(&table_id)
            .map(|file| file.schema().clone())
    }

    /// IDs of every registered table.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tuple::FieldType;
    use tempfile::tempdir;

    fn int_schema() -> Schema {
        Schema::new(vec![FieldType::Int])
    }

    #[test]
    fn test_register_and_lookup() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::new();

        let file = HeapFile::create(dir.path().join("t1.db"), TableId::new(1), int_schema())
            .unwrap();
        catalog.register(file);

        assert!(catalog.table(TableId::new(1)).is_some());
        assert_eq!(catalog.schema(TableId::new(1)), Some(int_schema()));
    }

    #[test]
    fn test_unknown_table() {
        let catalog = Catalog::new();
        assert!(catalog.table(TableId::new(42)).is_none());
        assert!(catalog.schema(TableId::new(42)).is_none());
    }

    #[test]
    fn test_table_ids() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::new();

        for id in [3u32, 1, 2] {
            let file = HeapFile::create(
                dir.path().join(format!("t{}.db", id)),
                TableId::new(id),
                int_schema(),
            )
            .unwrap();
            catalog.register(file);
        }

        let mut ids = catalog.table_ids();
        ids.sort();
        assert_eq!(ids, vec![TableId::new(1), TableId::new(2), TableId::new(3)]);
    }
}
