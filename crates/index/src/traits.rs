//! The capability interface every index variant implements.

use crate::range::KeyRange;
use crate::stats::IndexStats;
use alloc::format;
use alloc::vec::Vec;
use quarry_core::schema::Order;
use quarry_core::{DataType, Error, Result, Row, RowId, Value};

/// Which index variant an [`Index`] object is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    /// Membership set over row identifiers.
    RowId,
    /// Ordered map from column values to row identifiers.
    Ordered,
}

/// Core trait for all index implementations.
///
/// Keys are [`Value`]s; each implementation declares which key type it
/// accepts and rejects others with a data error.
pub trait Index {
    /// Returns the normalized index name (`table.index` or `table.#`).
    fn name(&self) -> &str;

    /// Returns which variant this is.
    fn kind(&self) -> IndexKind;

    /// Returns the key type this index accepts.
    fn key_type(&self) -> DataType;

    /// Returns true if each key maps to at most one row.
    fn is_unique(&self) -> bool;

    /// Adds a key/row pair.
    fn add(&mut self, key: Value, row_id: RowId) -> Result<()>;

    /// Replaces whatever `key` maps to with `row_id`.
    fn set(&mut self, key: Value, row_id: RowId) -> Result<()>;

    /// Removes `row_id` from `key`, or every row under `key` when `row_id`
    /// is `None`.
    fn remove(&mut self, key: &Value, row_id: Option<RowId>);

    /// Exact-match lookup.
    fn get(&self, key: &Value) -> Vec<RowId>;

    /// Range lookup. `None` means every key. Results are ordered by key in
    /// `order`, then `skip` entries are dropped, then at most `limit` are
    /// returned.
    fn get_range(
        &self,
        range: Option<&KeyRange<Value>>,
        order: Order,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<Vec<RowId>>;

    /// Estimated number of rows `range` touches.
    fn cost(&self, range: Option<&KeyRange<Value>>) -> usize;

    /// Checks if the index contains the given key.
    fn contains_key(&self, key: &Value) -> bool;

    /// Returns the number of row ids stored.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries from the index.
    fn clear(&mut self);

    /// Returns the statistics tracked for this index.
    fn stats(&self) -> &IndexStats;

    /// Serializes the index into rows a backstore can persist.
    fn serialize(&self) -> Vec<Row>;
}

/// Rebuilds an index from the rows [`Index::serialize`] produced.
pub trait DeserializeIndex: Index + Sized {
    fn deserialize(name: &str, rows: &[Row]) -> Result<Self>;
}

/// Fails with a data error unless `key` is a non-null value of `key_type`.
pub(crate) fn check_key(index: &str, key_type: DataType, key: &Value) -> Result<()> {
    match key.data_type() {
        Some(t) if t == key_type => Ok(()),
        got => Err(Error::data(format!(
            "index {} expects {} keys, got {}",
            index,
            key_type.name(),
            got.map(|t| t.name()).unwrap_or("null")
        ))),
    }
}

/// Validates every endpoint of `range` against `key_type`.
pub(crate) fn check_range(
    index: &str,
    key_type: DataType,
    range: Option<&KeyRange<Value>>,
) -> Result<()> {
    match range {
        Some(range) => range
            .endpoints()
            .try_for_each(|key| check_key(index, key_type, key)),
        None => Ok(()),
    }
}

/// Applies `skip` then `limit` to an already ordered id list.
pub(crate) fn slice(ids: Vec<RowId>, limit: Option<usize>, skip: usize) -> Vec<RowId> {
    let iter = ids.into_iter().skip(skip);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}
