//! Per-transaction staging of row and index changes.
//!
//! A `Journal` never writes to the cache. The first write to a table clones
//! that table's committed store; every later write goes to the clone. Reads
//! inside the transaction go through a `JournalView`, which prefers staged
//! stores over committed ones. Committing swaps the staged stores into the
//! cache; aborting just drops the journal.

use crate::cache::TableCache;
use crate::row_store::RowStore;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use quarry_core::{Error, Result, Row, RowId};
use quarry_index::Index;

/// Net changes made to one table.
#[derive(Clone, Debug, Default)]
pub struct TableDiff {
    table_name: String,
    added: BTreeMap<RowId, Rc<Row>>,
    modified: BTreeMap<RowId, (Rc<Row>, Rc<Row>)>,
    deleted: BTreeMap<RowId, Rc<Row>>,
}

impl TableDiff {
    /// Creates a new table diff.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Records an addition.
    pub fn add(&mut self, row: Rc<Row>) {
        let row_id = row.id();
        // Deleted then re-added within the same transaction.
        if let Some(old_row) = self.deleted.remove(&row_id) {
            self.modified.insert(row_id, (old_row, row));
        } else {
            self.added.insert(row_id, row);
        }
    }

    /// Records a modification.
    pub fn modify(&mut self, old: Rc<Row>, new: Rc<Row>) {
        let row_id = old.id();
        if self.added.contains_key(&row_id) {
            self.added.insert(row_id, new);
        } else if let Some((original, _)) = self.modified.remove(&row_id) {
            self.modified.insert(row_id, (original, new));
        } else {
            self.modified.insert(row_id, (old, new));
        }
    }

    /// Records a deletion.
    pub fn delete(&mut self, row: Rc<Row>) {
        let row_id = row.id();
        if self.added.remove(&row_id).is_some() {
            return;
        }
        match self.modified.remove(&row_id) {
            Some((original, _)) => self.deleted.insert(row_id, original),
            None => self.deleted.insert(row_id, row),
        };
    }

    /// Returns added rows.
    pub fn added(&self) -> &BTreeMap<RowId, Rc<Row>> {
        &self.added
    }

    /// Returns modified rows as `(old, new)` pairs.
    pub fn modified(&self) -> &BTreeMap<RowId, (Rc<Row>, Rc<Row>)> {
        &self.modified
    }

    /// Returns deleted rows.
    pub fn deleted(&self) -> &BTreeMap<RowId, Rc<Row>> {
        &self.deleted
    }

    /// Returns the rows that must be written to persistent storage.
    pub fn puts(&self) -> impl Iterator<Item = &Rc<Row>> + '_ {
        self.added
            .values()
            .chain(self.modified.values().map(|(_, new)| new))
    }

    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Staged changes of one transaction.
#[derive(Debug, Default)]
pub struct Journal {
    staged: BTreeMap<String, RowStore>,
    diffs: BTreeMap<String, TableDiff>,
    touched_indices: BTreeSet<String>,
}

impl Journal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, cache: &TableCache, table: &str) -> Result<&mut RowStore> {
        if !self.staged.contains_key(table) {
            let store = cache.snapshot(table)?;
            self.staged.insert(table.to_string(), store);
            self.diffs.insert(table.to_string(), TableDiff::new(table));
        }
        self.staged
            .get_mut(table)
            .ok_or_else(|| Error::table_not_found(table))
    }

    fn diff_mut(&mut self, table: &str) -> &mut TableDiff {
        self.diffs
            .entry(table.to_string())
            .or_insert_with(|| TableDiff::new(table))
    }

    /// Stages an insert.
    pub fn insert(&mut self, cache: &TableCache, table: &str, row: Row) -> Result<()> {
        let store = self.stage(cache, table)?;
        let row_id = row.id();
        store.insert(row)?;
        let staged = store.get(row_id).ok_or_else(|| Error::table_not_found(table))?;
        let touched: Vec<String> = store.indices().map(|i| i.name().to_string()).collect();

        self.touched_indices.extend(touched);
        self.diff_mut(table).add(staged);
        Ok(())
    }

    /// Stages an update of an existing row, returning the row it replaced.
    pub fn update(&mut self, cache: &TableCache, table: &str, row: Row) -> Result<Rc<Row>> {
        let store = self.stage(cache, table)?;
        let row_id = row.id();
        let old = store.update(row)?;
        let new = store.get(row_id).ok_or_else(|| Error::table_not_found(table))?;
        let touched: Vec<String> = store
            .column_indices()
            .filter(|(column, _)| old.get(*column) != new.get(*column))
            .map(|(_, index)| index.name().to_string())
            .collect();

        self.touched_indices.extend(touched);
        self.diff_mut(table).modify(old.clone(), new);
        Ok(old)
    }

    /// Stages a delete, returning the removed row.
    pub fn delete(&mut self, cache: &TableCache, table: &str, row_id: RowId) -> Result<Rc<Row>> {
        let store = self.stage(cache, table)?;
        let old = store.delete(row_id)?;
        let touched: Vec<String> = store.indices().map(|i| i.name().to_string()).collect();

        self.touched_indices.extend(touched);
        self.diff_mut(table).delete(old.clone());
        Ok(old)
    }

    /// Returns the staged store of a table, if the journal wrote to it.
    pub fn staged(&self, table: &str) -> Option<&RowStore> {
        self.staged.get(table)
    }

    /// Returns the names of tables with staged changes.
    pub fn staged_tables(&self) -> impl Iterator<Item = &str> + '_ {
        self.staged.keys().map(String::as_str)
    }

    /// Returns the diff of a table.
    pub fn diff(&self, table: &str) -> Option<&TableDiff> {
        self.diffs.get(table)
    }

    /// Returns all table diffs.
    pub fn diffs(&self) -> impl Iterator<Item = &TableDiff> + '_ {
        self.diffs.values()
    }

    /// Returns the normalized names of every index a staged write touched.
    pub fn touched_indices(&self) -> &BTreeSet<String> {
        &self.touched_indices
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.diffs.values().all(TableDiff::is_empty)
    }

    /// Installs every staged store into the cache.
    ///
    /// Tables are known to exist because they were cloned from this cache, so
    /// installation cannot fail half way.
    pub fn install(self, cache: &mut TableCache) -> Vec<TableDiff> {
        let mut installed = 0usize;
        for (_, store) in self.staged {
            if let Some(slot) = cache.get_table_mut(store.schema().name()) {
                *slot = store;
                installed += 1;
            }
        }
        tracing::trace!(tables = installed, "journal installed");
        self.diffs.into_values().filter(|d| !d.is_empty()).collect()
    }
}

/// Read view combining committed stores with a journal's staged ones.
#[derive(Clone, Copy, Debug)]
pub struct JournalView<'a> {
    cache: &'a TableCache,
    journal: Option<&'a Journal>,
}

impl<'a> JournalView<'a> {
    /// A view of committed data only.
    pub fn committed(cache: &'a TableCache) -> Self {
        Self { cache, journal: None }
    }

    /// A view of committed data overlaid with `journal`.
    pub fn new(cache: &'a TableCache, journal: &'a Journal) -> Self {
        Self {
            cache,
            journal: Some(journal),
        }
    }

    /// Returns the store a reader in this view sees for `table`.
    pub fn table(&self, table: &str) -> Option<&'a RowStore> {
        self.journal
            .and_then(|j| j.staged(table))
            .or_else(|| self.cache.get_table(table))
    }
}
