//! Committed row storage shared by every transaction.
//!
//! The `TableCache` holds one `RowStore` per table. It is only mutated when a
//! transaction commits, by swapping in the stores the transaction staged.

use crate::row_store::RowStore;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quarry_core::schema::Table;
use quarry_core::{Error, Result};

/// Cache for managing multiple table stores.
#[derive(Clone, Debug, Default)]
pub struct TableCache {
    tables: BTreeMap<String, RowStore>,
}

impl TableCache {
    /// Creates a new empty table cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table in the cache.
    pub fn create_table(&mut self, schema: Table) -> Result<()> {
        self.add_store(RowStore::new(schema))
    }

    /// Adds a pre-populated store, e.g. one loaded from a backstore.
    pub fn add_store(&mut self, store: RowStore) -> Result<()> {
        let name = store.schema().name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::invalid_schema(format!("Table already exists: {}", name)));
        }
        self.tables.insert(name, store);
        Ok(())
    }

    /// Returns a copy of a table's committed store.
    pub fn snapshot(&self, name: &str) -> Result<RowStore> {
        self.get_table(name)
            .cloned()
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Gets a reference to a table store.
    pub fn get_table(&self, name: &str) -> Option<&RowStore> {
        self.tables.get(name)
    }

    /// Gets a mutable reference to a table store.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut RowStore> {
        self.tables.get_mut(name)
    }

    /// Returns the number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns all table names.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }

    /// Returns the total row count across all tables.
    pub fn total_row_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use quarry_core::schema::TableBuilder;
    use quarry_core::{DataType, Row, RowId, Value};

    fn test_schema(name: &str) -> Table {
        TableBuilder::new(name)
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_primary_key("id")
            .unwrap()
            .build()
            .unwrap()
    }

    fn row(id: RowId, name: &str) -> Row {
        Row::new(id, vec![Value::Int64(id as i64), Value::String(name.into())])
    }

    #[test]
    fn test_cache_create_table() {
        let mut cache = TableCache::new();
        cache.create_table(test_schema("users")).unwrap();
        assert!(cache.get_table("users").is_some());
        assert!(cache.create_table(test_schema("users")).is_err());
        assert_eq!(cache.table_names(), vec!["users"]);
    }

    #[test]
    fn test_cache_snapshot_is_detached() {
        let mut cache = TableCache::new();
        cache.create_table(test_schema("users")).unwrap();
        let mut copy = cache.snapshot("users").unwrap();
        copy.insert(row(1, "Alice")).unwrap();

        assert_eq!(copy.len(), 1);
        assert_eq!(cache.total_row_count(), 0);
        assert!(cache.snapshot("ghost").is_err());
    }
}
