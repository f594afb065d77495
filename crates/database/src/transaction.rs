//! Explicit transactions.
//!
//! Queries attached to a transaction run synchronously against the committed
//! cache overlaid with the transaction's journal. Only `commit` suspends: it
//! flushes the journal to the backstore and installs it into the cache once
//! the flush resolves. Locks taken by writes are released at commit or abort.

use crate::backstore::BackstoreTx;
use crate::context::Context;
use crate::query_builder::{DeleteQuery, InsertQuery, Query, UpdateQuery};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use quarry_core::schema::Table;
use quarry_core::{Error, PersistedRow, Result, Row, RowId, Value};
use quarry_query::executor::ResultRow;
use quarry_query::query::SelectQuery;
use quarry_storage::{
    Journal, RowStore, TableCache, Transaction as StagedTransaction, TransactionId,
    TransactionState, TransactionType,
};
use std::rc::Rc;

/// Resolves when a transaction finishes: `Ok` once committed (immediately for
/// read-only transactions), an error when it is aborted or its flush fails.
pub type Completion = Shared<LocalBoxFuture<'static, Result<()>>>;

/// A database transaction.
pub struct Transaction {
    ctx: Rc<Context>,
    inner: StagedTransaction,
    signal: Option<oneshot::Sender<Result<()>>>,
    completion: Completion,
}

impl Transaction {
    pub(crate) fn new(ctx: Rc<Context>, tx_type: TransactionType) -> Self {
        let id = ctx.next_tx_id();
        let (signal, receiver) = oneshot::channel();
        let completion = receiver
            .map(move |result| result.unwrap_or_else(|_| Err(Error::aborted(id))))
            .boxed_local()
            .shared();

        let mut tx = Self {
            ctx,
            inner: StagedTransaction::begin(id, tx_type),
            signal: Some(signal),
            completion,
        };
        if tx_type == TransactionType::ReadOnly {
            tx.finish(Ok(()));
        }
        tracing::trace!(tx = id, ?tx_type, "transaction created");
        tx
    }

    pub fn id(&self) -> TransactionId {
        self.inner.id()
    }

    pub fn tx_type(&self) -> TransactionType {
        self.inner.tx_type()
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state()
    }

    /// Returns the completion signal. Every clone resolves to the same result.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    fn finish(&mut self, result: Result<()>) {
        if let Some(signal) = self.signal.take() {
            // The receiver lives in `self.completion`.
            let _ = signal.send(result);
        }
    }

    /// Runs one query inside the transaction and returns its rows.
    ///
    /// Writes return the rows they wrote (deleted rows for a delete). A query
    /// that fails to validate or bind is rejected without touching the
    /// transaction; a query that fails while running aborts it.
    pub fn attach(&mut self, query: impl Into<Query>) -> Result<Vec<ResultRow>> {
        let query = query.into();
        if let Err(err) = self.admit(&query) {
            tracing::warn!(tx = self.id(), error = %err, "query rejected");
            return Err(err);
        }

        let ctx = self.ctx.clone();
        let result = {
            let cache = ctx.cache.borrow();
            run(&ctx, &cache, &mut self.inner, &query)
        };
        if let Err(err) = &result {
            tracing::debug!(tx = self.id(), error = %err, "query failed, aborting");
            self.fail(err.clone());
        }
        result
    }

    fn admit(&self, query: &Query) -> Result<()> {
        if !self.inner.is_active() {
            return Err(Error::invalid_operation(format!(
                "transaction {} is no longer active",
                self.id()
            )));
        }
        query.check()?;
        let Some(table) = query.target() else {
            return Ok(());
        };
        if self.tx_type() == TransactionType::ReadOnly {
            return Err(Error::invalid_operation(format!(
                "transaction {} is read-only",
                self.id()
            )));
        }
        self.ctx.locks.borrow_mut().acquire(table.name(), self.id())
    }

    /// Runs `queries` in order, then commits. The first failure aborts the
    /// transaction.
    pub async fn exec(&mut self, queries: Vec<Query>) -> Result<Vec<Vec<ResultRow>>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            match self.attach(query) {
                Ok(rows) => results.push(rows),
                Err(err) => {
                    if self.inner.is_active() {
                        self.fail(err.clone());
                    }
                    return Err(err);
                }
            }
        }
        self.commit().await?;
        Ok(results)
    }

    /// Flushes the staged changes to the backstore, then makes them visible
    /// in the cache.
    ///
    /// If the flush fails nothing reaches the cache, the transaction ends up
    /// `Aborted` and the completion rejects with the flush error.
    pub async fn commit(&mut self) -> Result<()> {
        let journal = self.inner.prepare()?;
        let id = self.id();
        let result = flush(&self.ctx, id, journal).await;
        let settled = match &result {
            Ok(()) => self.inner.commit().map(drop),
            Err(err) => {
                tracing::warn!(tx = id, error = %err, "commit failed");
                self.inner.abort()
            }
        };
        self.ctx.release_locks(id);
        self.finish(result.clone());
        settled.and(result)
    }

    /// Drops the staged changes. The completion signal fails with an
    /// aborted error.
    pub fn abort(&mut self) -> Result<()> {
        let id = self.id();
        self.inner.abort()?;
        self.ctx.release_locks(id);
        self.finish(Err(Error::aborted(id)));
        Ok(())
    }

    fn fail(&mut self, err: Error) {
        let id = self.id();
        if self.inner.abort().is_ok() {
            self.ctx.release_locks(id);
            self.finish(Err(err));
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.inner.is_active() {
            self.ctx.release_locks(self.id());
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("tx_type", &self.tx_type())
            .field("state", &self.state())
            .finish()
    }
}

/// Runs a single query in a transaction of its own.
pub(crate) async fn exec_implicit(ctx: Rc<Context>, query: Query) -> Result<Vec<ResultRow>> {
    if let Err(err) = query.check() {
        tracing::warn!(error = %err, "query rejected");
        return Err(err);
    }
    let mut tx = Transaction::new(ctx, query.tx_type());
    let rows = tx.attach(query)?;
    tx.commit().await?;
    Ok(rows)
}

fn run(
    ctx: &Context,
    cache: &TableCache,
    tx: &mut StagedTransaction,
    query: &Query,
) -> Result<Vec<ResultRow>> {
    match query {
        Query::Select(q) => select(ctx, cache, tx, q),
        Query::Insert(q) => insert(ctx, cache, tx, q),
        Query::Update(q) => update(ctx, cache, tx, q),
        Query::Delete(q) => delete(ctx, cache, tx, q),
    }
}

fn select(
    ctx: &Context,
    cache: &TableCache,
    tx: &StagedTransaction,
    query: &SelectQuery,
) -> Result<Vec<ResultRow>> {
    let view = tx.view(cache)?;
    if ctx.options.log_plans {
        let plan = ctx.planner.explain(query, &view)?;
        tracing::debug!(tx = tx.id(), %plan, "select plan");
    }
    ctx.planner.execute(query, &view)
}

fn insert(
    ctx: &Context,
    cache: &TableCache,
    tx: &mut StagedTransaction,
    query: &InsertQuery,
) -> Result<Vec<ResultRow>> {
    let name = query.table.name();
    for values in &query.rows {
        let existing = if query.or_replace {
            tx.view(cache)?
                .table(name)
                .and_then(|store| find_by_primary_key(store, values))
        } else {
            None
        };
        match existing {
            Some(old) => {
                tx.update(cache, name, Row::new(old.id(), values.clone()))?;
            }
            None => {
                tx.insert(cache, name, Row::new(ctx.row_ids.next_id(), values.clone()))?;
            }
        }
    }
    Ok(result_rows(&query.table, query.rows.iter().cloned()))
}

fn find_by_primary_key(store: &RowStore, values: &[Value]) -> Option<Rc<Row>> {
    let schema = store.schema();
    let column = schema.get_column_index(&schema.primary_key()?.column().name)?;
    store.find_by_primary_key(values.get(column)?)
}

fn update(
    ctx: &Context,
    cache: &TableCache,
    tx: &mut StagedTransaction,
    query: &UpdateQuery,
) -> Result<Vec<ResultRow>> {
    let name = query.table.name();
    let rows = {
        let view = tx.view(cache)?;
        ctx.planner
            .matching_rows(&query.table, query.where_clause.as_ref(), &view)?
    };

    let mut written = Vec::with_capacity(rows.len());
    for old in rows {
        let mut values = old.values().to_vec();
        for (column, value) in &query.sets {
            if let Some(slot) = values.get_mut(column.index) {
                *slot = value.clone();
            }
        }
        tx.update(cache, name, old.with_values(values.clone()))?;
        written.push(values);
    }
    Ok(result_rows(&query.table, written.into_iter()))
}

fn delete(
    ctx: &Context,
    cache: &TableCache,
    tx: &mut StagedTransaction,
    query: &DeleteQuery,
) -> Result<Vec<ResultRow>> {
    let name = query.table.name();
    let rows = {
        let view = tx.view(cache)?;
        ctx.planner
            .matching_rows(&query.table, query.where_clause.as_ref(), &view)?
    };

    let mut removed = Vec::with_capacity(rows.len());
    for row in rows {
        tx.delete(cache, name, row.id())?;
        removed.push(row.values().to_vec());
    }
    Ok(result_rows(&query.table, removed.into_iter()))
}

fn result_rows(table: &Table, rows: impl Iterator<Item = Vec<Value>>) -> Vec<ResultRow> {
    let columns: Rc<[String]> = table
        .columns()
        .iter()
        .map(|c| c.output_name().to_string())
        .collect::<Vec<_>>()
        .into();
    rows.map(|values| ResultRow::new(columns.clone(), values))
        .collect()
}

/// Writes `journal` to the backstore and, once that resolves, installs it
/// into the cache.
async fn flush(ctx: &Context, tx: TransactionId, journal: Journal) -> Result<()> {
    if journal.is_empty() {
        return Ok(());
    }

    let mut store_tx = ctx.backstore.create_tx(TransactionType::ReadWrite);
    if let Err(err) = write_journal(ctx, store_tx.as_mut(), &journal) {
        store_tx.abort();
        return Err(err);
    }
    store_tx.commit().await?;

    let diffs = journal.install(&mut ctx.cache.borrow_mut());
    let rows: usize = diffs
        .iter()
        .map(|d| d.added().len() + d.modified().len() + d.deleted().len())
        .sum();
    tracing::debug!(tx, tables = diffs.len(), rows, "changes installed");
    Ok(())
}

fn write_journal(ctx: &Context, store_tx: &mut dyn BackstoreTx, journal: &Journal) -> Result<()> {
    for diff in journal.diffs().filter(|d| !d.is_empty()) {
        let name = diff.table_name();
        let puts: Vec<PersistedRow> = diff
            .puts()
            .map(|row| PersistedRow::from(row.as_ref()))
            .collect();
        if !puts.is_empty() {
            store_tx.put(name, puts)?;
        }
        let removed: Vec<RowId> = diff.deleted().keys().copied().collect();
        if !removed.is_empty() {
            store_tx.remove(name, removed)?;
        }
    }

    let touched = journal.touched_indices();
    for table in journal.staged_tables() {
        let Some(store) = journal.staged(table) else {
            continue;
        };
        if !ctx.options.persists_indices(store.schema()) {
            if store.schema().persistent_index() {
                // Emptied index stores are rebuilt from the rows on open.
                for index in store.indices() {
                    store_tx.clear(index.name())?;
                }
            }
            continue;
        }
        for index in store.indices().filter(|i| touched.contains(i.name())) {
            let rows = index
                .serialize()
                .into_iter()
                .map(PersistedRow::from)
                .collect();
            store_tx.clear(index.name())?;
            store_tx.put(index.name(), rows)?;
        }
    }
    Ok(())
}
