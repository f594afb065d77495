//! The explicit context shared by every component of one database.

use crate::backstore::Backstore;
use crate::options::DatabaseOptions;
use quarry_core::schema::DatabaseSchema;
use quarry_core::RowIdAllocator;
use quarry_query::planner::QueryPlanner;
use quarry_storage::{LockManager, TableCache, TransactionId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Schema, cache, backstore and bookkeeping of one open database.
///
/// Built once by [`Database::open`](crate::Database::open) and handed to
/// builders and transactions through an `Rc`.
pub struct Context {
    pub(crate) schema: DatabaseSchema,
    pub(crate) cache: RefCell<TableCache>,
    pub(crate) backstore: Rc<dyn Backstore>,
    pub(crate) row_ids: RowIdAllocator,
    pub(crate) locks: RefCell<LockManager>,
    pub(crate) planner: QueryPlanner,
    pub(crate) options: DatabaseOptions,
    next_tx: Cell<TransactionId>,
}

impl Context {
    pub(crate) fn new(
        schema: DatabaseSchema,
        cache: TableCache,
        backstore: Rc<dyn Backstore>,
        row_ids: RowIdAllocator,
        options: DatabaseOptions,
    ) -> Self {
        Self {
            schema,
            cache: RefCell::new(cache),
            backstore,
            row_ids,
            locks: RefCell::new(LockManager::new()),
            planner: QueryPlanner::new(),
            options,
            next_tx: Cell::new(1),
        }
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Hands out the next transaction id.
    pub(crate) fn next_tx_id(&self) -> TransactionId {
        let id = self.next_tx.get();
        self.next_tx.set(id + 1);
        id
    }

    /// Releases every table lock held by `tx`.
    pub(crate) fn release_locks(&self, tx: TransactionId) {
        if let Ok(mut locks) = self.locks.try_borrow_mut() {
            locks.release_all(tx);
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("schema", &self.schema.name())
            .field(
                "tables",
                &self.cache.try_borrow().ok().map(|c| c.table_count()),
            )
            .field("next_row_id", &self.row_ids.peek())
            .field("options", &self.options)
            .finish()
    }
}
