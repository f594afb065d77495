//! Relation and RelationEntry types for query execution.

use crate::ast::{ColumnRef, RowSource};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use quarry_core::{Row, Value};

/// Shared table names to avoid repeated cloning during joins.
pub type SharedTables = Rc<[String]>;

/// One tuple of a relation: a row per table, plus aggregate values once the
/// relation has been grouped.
#[derive(Clone, Debug, Default)]
pub struct RelationEntry {
    /// Rows, one per table of the owning relation and in the same order.
    pub rows: Vec<Rc<Row>>,
    /// Aggregate results, in projection order.
    pub aggregates: Vec<Value>,
}

impl RelationEntry {
    pub fn new(rows: Vec<Rc<Row>>) -> Self {
        Self {
            rows,
            aggregates: Vec::new(),
        }
    }

    /// Single-row entry.
    pub fn from_row(row: Rc<Row>) -> Self {
        Self::new(alloc::vec![row])
    }

    /// Concatenates the rows of two entries.
    pub fn combine(left: &RelationEntry, right: &RelationEntry) -> Self {
        let mut rows = Vec::with_capacity(left.rows.len() + right.rows.len());
        rows.extend(left.rows.iter().cloned());
        rows.extend(right.rows.iter().cloned());
        Self::new(rows)
    }
}

/// A set of entries over an ordered list of tables.
#[derive(Clone, Debug)]
pub struct Relation {
    pub entries: Vec<RelationEntry>,
    tables: SharedTables,
}

impl Relation {
    pub fn new(entries: Vec<RelationEntry>, tables: SharedTables) -> Self {
        Self { entries, tables }
    }

    /// Relation over a single table.
    pub fn from_rows(rows: Vec<Rc<Row>>, table: impl Into<String>) -> Self {
        let tables: SharedTables = Rc::from(alloc::vec![table.into()]);
        Self::new(rows.into_iter().map(RelationEntry::from_row).collect(), tables)
    }

    /// Effective names of the tables, in entry row order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn shared_tables(&self) -> SharedTables {
        self.tables.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a view that resolves columns of `entry`.
    pub fn view<'a>(&'a self, entry: &'a RelationEntry) -> EntryView<'a> {
        EntryView {
            tables: &self.tables,
            entry,
        }
    }

    /// Table list of the join of `left` and `right`.
    pub fn combined_tables(left: &Relation, right: &Relation) -> SharedTables {
        left.tables
            .iter()
            .chain(right.tables.iter())
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }
}

/// Column access into one entry of a relation.
#[derive(Clone, Copy, Debug)]
pub struct EntryView<'a> {
    tables: &'a [String],
    entry: &'a RelationEntry,
}

impl<'a> EntryView<'a> {
    pub fn new(tables: &'a [String], entry: &'a RelationEntry) -> Self {
        Self { tables, entry }
    }

    /// Row of table `table` in this entry.
    pub fn row(&self, table: &str) -> Option<&'a Rc<Row>> {
        let pos = self.tables.iter().position(|t| t == table)?;
        self.entry.rows.get(pos)
    }

    /// Value of `column` in this entry, borrowed from the entry itself.
    pub fn get(&self, column: &ColumnRef) -> Option<&'a Value> {
        self.row(&column.table).and_then(|row| row.get(column.index))
    }
}

impl RowSource for EntryView<'_> {
    fn value(&self, column: &ColumnRef) -> Option<&Value> {
        self.get(column)
    }
}
