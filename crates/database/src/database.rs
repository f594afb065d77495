//! Database - main entry point for Quarry operations.
//!
//! Opening a database initializes the backstore, loads every table into the
//! cache and restarts row-id allocation after the largest loaded id. Tables
//! that persist their indices load them from their index stores instead of
//! rebuilding them.

use crate::backstore::{Backstore, BackstoreTx};
use crate::context::Context;
use crate::options::DatabaseOptions;
use crate::query_builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::transaction::Transaction;
use quarry_core::schema::{DatabaseSchema, Table};
use quarry_core::{Error, ErrorKind, PersistedRow, Result, Row, RowIdAllocator};
use quarry_index::{DeserializeIndex, OrderedIndex, RowIdIndex};
use quarry_query::ast::Expr;
use quarry_storage::{RowStore, TableCache, TransactionType};
use std::rc::Rc;

/// An open database.
///
/// Cloning is cheap; clones share the same context.
#[derive(Clone, Debug)]
pub struct Database {
    ctx: Rc<Context>,
}

impl Database {
    /// Opens a database over `backstore`.
    pub async fn open(
        schema: DatabaseSchema,
        backstore: Rc<dyn Backstore>,
        options: DatabaseOptions,
    ) -> Result<Self> {
        options.validate()?;
        backstore.init(&schema).await?;

        let store_tx = backstore.create_tx(TransactionType::ReadOnly);
        let row_ids = RowIdAllocator::new(options.first_row_id);
        let mut cache = TableCache::new();
        for table in schema.tables() {
            let store = load_store(store_tx.as_ref(), table, options.persists_indices(table))?;
            if let Some(max) = store.max_row_id() {
                row_ids.observe(max);
            }
            cache.add_store(store)?;
        }
        store_tx.commit().await?;

        tracing::info!(
            db = schema.name(),
            version = schema.version(),
            tables = cache.table_count(),
            rows = cache.total_row_count(),
            "database opened"
        );
        let ctx = Context::new(schema, cache, backstore, row_ids, options);
        Ok(Self { ctx: Rc::new(ctx) })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.ctx.schema
    }

    /// Looks up a table of the schema.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.ctx.schema.table(name)
    }

    /// Returns the number of committed rows in `table`.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        self.ctx
            .cache
            .borrow()
            .get_table(table)
            .map(RowStore::len)
            .ok_or_else(|| Error::table_not_found(table))
    }

    /// Starts a select. An empty column list selects every column.
    pub fn select(&self, columns: Vec<Expr>) -> SelectBuilder {
        SelectBuilder::new(self.ctx.clone(), columns)
    }

    pub fn insert(&self, table: &Table) -> InsertBuilder {
        InsertBuilder::new(self.ctx.clone(), table, false)
    }

    /// Starts an insert that replaces rows with an equal primary key.
    pub fn insert_or_replace(&self, table: &Table) -> InsertBuilder {
        InsertBuilder::new(self.ctx.clone(), table, true)
    }

    pub fn update(&self, table: &Table) -> UpdateBuilder {
        UpdateBuilder::new(self.ctx.clone(), table)
    }

    pub fn delete(&self, table: &Table) -> DeleteBuilder {
        DeleteBuilder::new(self.ctx.clone(), table)
    }

    /// Begins an explicit transaction.
    pub fn create_transaction(&self, tx_type: TransactionType) -> Transaction {
        Transaction::new(self.ctx.clone(), tx_type)
    }
}

fn to_rows(persisted: Vec<PersistedRow>) -> Vec<Row> {
    persisted.into_iter().map(Row::from).collect()
}

/// Reads the index store `name`. `None` if the backstore never created it
/// or it was emptied; a serialized index always holds at least one row.
fn read_index(tx: &dyn BackstoreTx, name: &str) -> Result<Option<Vec<Row>>> {
    match tx.get_table(name) {
        Ok(persisted) if persisted.is_empty() => Ok(None),
        Ok(persisted) => Ok(Some(to_rows(persisted))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn load_store(tx: &dyn BackstoreTx, table: &Table, persistent: bool) -> Result<RowStore> {
    let rows = to_rows(tx.get_table(table.name())?);
    if !persistent {
        return RowStore::from_rows(table.clone(), rows);
    }

    let row_id_name = table.row_id_index_name();
    let Some(row_id_rows) = read_index(tx, &row_id_name)? else {
        tracing::debug!(table = table.name(), "persisted indices missing, rebuilding");
        return RowStore::from_rows(table.clone(), rows);
    };
    let row_id_index = RowIdIndex::deserialize(&row_id_name, &row_id_rows)?;

    let mut indices = Vec::new();
    for def in table.indices() {
        let name = def.normalized_name();
        if let Some(index_rows) = read_index(tx, &name)? {
            indices.push(OrderedIndex::deserialize(&name, &index_rows)?);
        }
    }
    tracing::trace!(
        table = table.name(),
        rows = rows.len(),
        indices = indices.len(),
        "loaded persisted indices"
    );
    RowStore::from_parts(table.clone(), rows, row_id_index, indices)
}
