//! Row storage for a single table.
//!
//! A `RowStore` owns the rows of one table together with the table's row-id
//! index and one ordered index per declared index, and keeps all of them in
//! step on every write. Uniqueness is checked before anything is touched, so
//! a rejected write leaves rows and indices exactly as they were.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use quarry_core::schema::Table;
use quarry_core::{Error, Result, Row, RowId, Value};
use quarry_index::{Index, KeyRange, Order, OrderedIndex, RowIdIndex};

/// An ordered index together with the column it is keyed on.
#[derive(Clone, Debug)]
struct ColumnIndex {
    column: usize,
    index: OrderedIndex,
}

impl ColumnIndex {
    fn key_of(&self, row: &Row) -> Value {
        row.get(self.column).cloned().unwrap_or(Value::Null)
    }
}

/// Row storage for a single table.
#[derive(Clone, Debug)]
pub struct RowStore {
    schema: Table,
    rows: BTreeMap<RowId, Rc<Row>>,
    row_id_index: RowIdIndex,
    indices: Vec<ColumnIndex>,
}

impl RowStore {
    /// Creates an empty store with fresh indices for `schema`.
    pub fn new(schema: Table) -> Self {
        let mut indices = Vec::with_capacity(schema.indices().len());
        for def in schema.indices() {
            if let Some(column) = schema.get_column_index(&def.column().name) {
                let key_type = schema.columns()[column].data_type();
                indices.push(ColumnIndex {
                    column,
                    index: OrderedIndex::from_def(def, key_type),
                });
            }
        }

        Self {
            row_id_index: RowIdIndex::new(schema.row_id_index_name()),
            schema,
            rows: BTreeMap::new(),
            indices,
        }
    }

    /// Builds a store from persisted rows, rebuilding every index.
    pub fn from_rows(schema: Table, rows: Vec<Row>) -> Result<Self> {
        let mut store = Self::new(schema);
        for row in rows {
            store.insert(row)?;
        }
        Ok(store)
    }

    /// Builds a store from persisted rows and previously serialized indices.
    ///
    /// `indices` must hold one ordered index per declared index, matched by
    /// normalized name; anything missing is rebuilt from the rows.
    pub fn from_parts(
        schema: Table,
        rows: Vec<Row>,
        row_id_index: RowIdIndex,
        mut indices: Vec<OrderedIndex>,
    ) -> Result<Self> {
        let mut store = Self::new(schema);
        if row_id_index.len() != rows.len() {
            return Err(Error::data(format!(
                "row id index {} holds {} ids but {} rows were loaded",
                row_id_index.name(),
                row_id_index.len(),
                rows.len()
            )));
        }

        let mut rebuild = Vec::new();
        for (pos, slot) in store.indices.iter_mut().enumerate() {
            match indices.iter().position(|i| i.name() == slot.index.name()) {
                Some(found) => slot.index = indices.swap_remove(found),
                None => rebuild.push(pos),
            }
        }

        for row in rows {
            for &pos in &rebuild {
                let slot = &mut store.indices[pos];
                slot.index.add(slot.key_of(&row), row.id())?;
            }
            store.rows.insert(row.id(), Rc::new(row));
        }
        store.row_id_index = row_id_index;
        Ok(store)
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_unique(&self, row: &Row) -> Result<()> {
        for slot in &self.indices {
            let key = slot.key_of(row);
            if slot.index.would_violate(&key, row.id()) {
                return Err(Error::unique_constraint(slot.index.name(), key));
            }
        }
        Ok(())
    }

    /// Inserts a row into the store.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        let row_id = row.id();
        if self.rows.contains_key(&row_id) {
            return Err(Error::invalid_operation(format!(
                "row {} already exists in {}",
                row_id,
                self.schema.name()
            )));
        }
        self.schema.validate_row(row.values())?;
        self.check_unique(&row)?;

        self.row_id_index.add(Value::Int64(row_id as i64), row_id)?;
        for slot in &mut self.indices {
            slot.index.add(slot.key_of(&row), row_id)?;
        }
        self.rows.insert(row_id, Rc::new(row));
        Ok(())
    }

    /// Replaces the payload of an existing row, returning the previous one.
    pub fn update(&mut self, row: Row) -> Result<Rc<Row>> {
        let row_id = row.id();
        let old = self.get(row_id).ok_or_else(|| self.missing(row_id))?;
        self.schema.validate_row(row.values())?;
        self.check_unique(&row)?;

        for slot in &mut self.indices {
            let old_key = slot.key_of(&old);
            let new_key = slot.key_of(&row);
            if old_key != new_key {
                slot.index.remove(&old_key, Some(row_id));
                slot.index.add(new_key, row_id)?;
            }
        }
        self.rows.insert(row_id, Rc::new(row));
        Ok(old)
    }

    /// Deletes a row from the store.
    pub fn delete(&mut self, row_id: RowId) -> Result<Rc<Row>> {
        let row = self.rows.remove(&row_id).ok_or_else(|| self.missing(row_id))?;
        self.row_id_index.remove(&Value::Int64(row_id as i64), Some(row_id));
        for slot in &mut self.indices {
            slot.index.remove(&slot.key_of(&row), Some(row_id));
        }
        Ok(row)
    }

    fn missing(&self, row_id: RowId) -> Error {
        Error::invalid_operation(format!("row {} not found in {}", row_id, self.schema.name()))
    }

    /// Gets a row by ID.
    pub fn get(&self, row_id: RowId) -> Option<Rc<Row>> {
        self.rows.get(&row_id).cloned()
    }

    /// Gets rows by ID, skipping ids that are not present.
    pub fn get_many(&self, row_ids: &[RowId]) -> Vec<Rc<Row>> {
        row_ids.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Returns an iterator over all rows in row-id order.
    pub fn scan(&self) -> impl Iterator<Item = Rc<Row>> + '_ {
        self.rows.values().cloned()
    }

    /// Returns the largest row id stored.
    pub fn max_row_id(&self) -> Option<RowId> {
        self.rows.keys().next_back().copied()
    }

    /// Returns the row-id index.
    pub fn row_id_index(&self) -> &RowIdIndex {
        &self.row_id_index
    }

    /// Looks up an index by bare name, normalized name, or row-id index name.
    pub fn index(&self, name: &str) -> Option<&dyn Index> {
        if name == self.row_id_index.name() {
            return Some(&self.row_id_index);
        }
        self.indices
            .iter()
            .find(|slot| {
                let full = slot.index.name();
                full == name
                    || full
                        .strip_prefix(self.schema.name())
                        .and_then(|rest| rest.strip_prefix('.'))
                        == Some(name)
            })
            .map(|slot| &slot.index as &dyn Index)
    }

    /// Returns the ordered indices together with their key column positions.
    pub fn column_indices(&self) -> impl Iterator<Item = (usize, &OrderedIndex)> + '_ {
        self.indices.iter().map(|slot| (slot.column, &slot.index))
    }

    /// Returns every index, the row-id index first.
    pub fn indices(&self) -> impl Iterator<Item = &dyn Index> + '_ {
        core::iter::once(&self.row_id_index as &dyn Index)
            .chain(self.indices.iter().map(|slot| &slot.index as &dyn Index))
    }

    /// Reads the rows an index range selects, in index order.
    pub fn index_scan(
        &self,
        index: &str,
        range: Option<&KeyRange<Value>>,
        order: Order,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<Vec<Rc<Row>>> {
        let index = self
            .index(index)
            .ok_or_else(|| Error::index_not_found(self.schema.name(), index))?;
        let ids = index.get_range(range, order, limit, skip)?;
        Ok(self.get_many(&ids))
    }

    /// Finds the row whose primary key equals `key`.
    pub fn find_by_primary_key(&self, key: &Value) -> Option<Rc<Row>> {
        let pk = self.schema.primary_key()?;
        let ids = self.index(pk.name())?.get(key);
        ids.first().and_then(|id| self.get(*id))
    }
}
