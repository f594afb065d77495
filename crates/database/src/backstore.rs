//! Persistent storage beneath the cache.
//!
//! A [`Backstore`] keeps one keyed store of [`PersistedRow`]s per table and,
//! for tables that persist their indices, one store per index named after the
//! index (`table.index`, `table.#`). Writes go through a [`BackstoreTx`] and
//! become durable only when its commit future resolves.

use futures::future::{self, FutureExt, LocalBoxFuture};
use quarry_core::schema::DatabaseSchema;
use quarry_core::{Error, PersistedRow, Result, RowId};
use quarry_index::Index;
use quarry_storage::{RowStore, TransactionType};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Adapter contract for persistent storage.
pub trait Backstore {
    /// Creates the stores `schema` needs. Existing stores are kept.
    fn init(&self, schema: &DatabaseSchema) -> LocalBoxFuture<'_, Result<()>>;

    /// Starts a backstore transaction.
    fn create_tx(&self, tx_type: TransactionType) -> Box<dyn BackstoreTx>;
}

/// One backstore transaction.
///
/// Reads see committed data only. Writes are buffered until
/// [`commit`](BackstoreTx::commit).
pub trait BackstoreTx {
    fn tx_type(&self) -> TransactionType;

    /// Returns every persisted row of the store `name`, ordered by id.
    fn get_table(&self, name: &str) -> Result<Vec<PersistedRow>>;

    /// Writes rows, replacing rows with the same id.
    fn put(&mut self, name: &str, rows: Vec<PersistedRow>) -> Result<()>;

    /// Removes rows by id.
    fn remove(&mut self, name: &str, ids: Vec<RowId>) -> Result<()>;

    /// Removes every row of the store.
    fn clear(&mut self, name: &str) -> Result<()>;

    /// Applies the buffered writes.
    fn commit(self: Box<Self>) -> LocalBoxFuture<'static, Result<()>>;

    /// Drops the buffered writes.
    fn abort(self: Box<Self>);
}

type Stores = BTreeMap<String, BTreeMap<RowId, PersistedRow>>;

/// Backstore keeping every store in memory.
///
/// Clones share the same stores, so a database reopened on a clone sees
/// everything committed through the original.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackstore {
    stores: Rc<RefCell<Stores>>,
}

impl MemoryBackstore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all stores.
    pub fn store_names(&self) -> Vec<String> {
        self.stores.borrow().keys().cloned().collect()
    }

    /// Returns the number of rows in store `name`.
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.stores.borrow().get(name).map(BTreeMap::len)
    }
}

impl Backstore for MemoryBackstore {
    fn init(&self, schema: &DatabaseSchema) -> LocalBoxFuture<'_, Result<()>> {
        let mut stores = self.stores.borrow_mut();
        for table in schema.tables() {
            stores.entry(table.name().to_string()).or_default();
            if !table.persistent_index() {
                continue;
            }
            let empty = RowStore::new(table.clone());
            for index in empty.indices() {
                stores.entry(index.name().to_string()).or_insert_with(|| {
                    index
                        .serialize()
                        .into_iter()
                        .map(|row| (row.id(), PersistedRow::from(row)))
                        .collect()
                });
            }
        }
        tracing::trace!(schema = schema.name(), stores = stores.len(), "memory backstore ready");
        future::ready(Ok(())).boxed_local()
    }

    fn create_tx(&self, tx_type: TransactionType) -> Box<dyn BackstoreTx> {
        Box::new(MemoryTx {
            stores: self.stores.clone(),
            tx_type,
            writes: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum Write {
    Put(String, Vec<PersistedRow>),
    Remove(String, Vec<RowId>),
    Clear(String),
}

/// Transaction over a [`MemoryBackstore`].
#[derive(Debug)]
pub struct MemoryTx {
    stores: Rc<RefCell<Stores>>,
    tx_type: TransactionType,
    writes: Vec<Write>,
}

impl MemoryTx {
    fn check_writable(&self) -> Result<()> {
        match self.tx_type {
            TransactionType::ReadWrite => Ok(()),
            TransactionType::ReadOnly => Err(Error::invalid_operation(
                "backstore transaction is read-only",
            )),
        }
    }
}

impl BackstoreTx for MemoryTx {
    fn tx_type(&self) -> TransactionType {
        self.tx_type
    }

    fn get_table(&self, name: &str) -> Result<Vec<PersistedRow>> {
        self.stores
            .borrow()
            .get(name)
            .map(|store| store.values().cloned().collect())
            .ok_or_else(|| Error::table_not_found(name))
    }

    fn put(&mut self, name: &str, rows: Vec<PersistedRow>) -> Result<()> {
        self.check_writable()?;
        self.writes.push(Write::Put(name.to_string(), rows));
        Ok(())
    }

    fn remove(&mut self, name: &str, ids: Vec<RowId>) -> Result<()> {
        self.check_writable()?;
        self.writes.push(Write::Remove(name.to_string(), ids));
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.check_writable()?;
        self.writes.push(Write::Clear(name.to_string()));
        Ok(())
    }

    fn commit(self: Box<Self>) -> LocalBoxFuture<'static, Result<()>> {
        let MemoryTx {
            stores: shared,
            writes,
            ..
        } = *self;
        let mut stores = shared.borrow_mut();
        let count = writes.len();
        for write in writes {
            match write {
                Write::Put(name, rows) => {
                    let store = stores.entry(name).or_default();
                    store.extend(rows.into_iter().map(|row| (row.id, row)));
                }
                Write::Remove(name, ids) => {
                    if let Some(store) = stores.get_mut(&name) {
                        for id in ids {
                            store.remove(&id);
                        }
                    }
                }
                Write::Clear(name) => {
                    stores.entry(name).or_default().clear();
                }
            }
        }
        tracing::trace!(writes = count, "memory backstore commit");
        future::ready(Ok(())).boxed_local()
    }

    fn abort(self: Box<Self>) {
        tracing::trace!(dropped = self.writes.len(), "memory backstore abort");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use quarry_core::schema::TableBuilder;
    use quarry_core::{DataType, ErrorKind, Value};

    fn schema() -> DatabaseSchema {
        let plain = TableBuilder::new("note")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .build()
            .unwrap();
        let indexed = TableBuilder::new("holiday")
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_column("begin", DataType::DateTime)
            .unwrap()
            .add_primary_key("name")
            .unwrap()
            .add_index("idxBegin", "begin", false, Default::default())
            .unwrap()
            .persistent_index(true)
            .build()
            .unwrap();
        DatabaseSchema::new("db", 1)
            .unwrap()
            .add_table(plain)
            .unwrap()
            .add_table(indexed)
            .unwrap()
    }

    fn row(id: RowId, v: i64) -> PersistedRow {
        PersistedRow {
            id,
            payload: vec![Value::Int64(v)],
        }
    }

    #[test]
    fn test_init_creates_table_and_index_stores() {
        let backstore = MemoryBackstore::new();
        block_on(backstore.init(&schema())).unwrap();

        let names = backstore.store_names();
        for expected in ["note", "holiday", "holiday.#", "holiday.pkHoliday", "holiday.idxBegin"] {
            assert!(names.iter().any(|n| n == expected), "missing store {}", expected);
        }
        assert!(!names.iter().any(|n| n == "note.#"));
        // Seeded with the serialized empty index.
        assert_eq!(backstore.row_count("holiday.#"), Some(1));
        assert_eq!(backstore.row_count("holiday.idxBegin"), Some(1));
    }

    #[test]
    fn test_init_keeps_existing_rows() {
        let backstore = MemoryBackstore::new();
        block_on(backstore.init(&schema())).unwrap();
        let mut tx = backstore.create_tx(TransactionType::ReadWrite);
        tx.put("note", vec![row(1, 10)]).unwrap();
        block_on(tx.commit()).unwrap();

        block_on(backstore.init(&schema())).unwrap();
        assert_eq!(backstore.row_count("note"), Some(1));
    }

    #[test]
    fn test_writes_are_buffered_until_commit() {
        let backstore = MemoryBackstore::new();
        block_on(backstore.init(&schema())).unwrap();

        let mut tx = backstore.create_tx(TransactionType::ReadWrite);
        tx.put("note", vec![row(1, 10), row(2, 20)]).unwrap();
        assert_eq!(backstore.row_count("note"), Some(0));
        block_on(tx.commit()).unwrap();
        assert_eq!(backstore.row_count("note"), Some(2));

        let mut tx = backstore.create_tx(TransactionType::ReadWrite);
        tx.remove("note", vec![1]).unwrap();
        tx.put("note", vec![row(2, 21)]).unwrap();
        tx.abort();
        assert_eq!(backstore.row_count("note"), Some(2));

        let mut tx = backstore.create_tx(TransactionType::ReadWrite);
        tx.remove("note", vec![1]).unwrap();
        tx.put("note", vec![row(2, 21)]).unwrap();
        block_on(tx.commit()).unwrap();
        let rows = backstore
            .create_tx(TransactionType::ReadOnly)
            .get_table("note")
            .unwrap();
        assert_eq!(rows, vec![row(2, 21)]);
    }

    #[test]
    fn test_clear_then_put_rewrites_store() {
        let backstore = MemoryBackstore::new();
        block_on(backstore.init(&schema())).unwrap();
        let mut tx = backstore.create_tx(TransactionType::ReadWrite);
        tx.clear("holiday.idxBegin").unwrap();
        tx.put("holiday.idxBegin", vec![row(0, 1)]).unwrap();
        block_on(tx.commit()).unwrap();
        assert_eq!(backstore.row_count("holiday.idxBegin"), Some(1));
    }

    #[test]
    fn test_read_only_tx_rejects_writes() {
        let backstore = MemoryBackstore::new();
        block_on(backstore.init(&schema())).unwrap();
        let mut tx = backstore.create_tx(TransactionType::ReadOnly);
        let err = tx.put("note", vec![row(1, 1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_missing_store() {
        let backstore = MemoryBackstore::new();
        let tx = backstore.create_tx(TransactionType::ReadOnly);
        assert_eq!(tx.get_table("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }
}
