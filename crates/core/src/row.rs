//! Row structure for Quarry.
//!
//! Rows are immutable once stored: an update produces a new [`Row`] carrying
//! the same identifier and a new payload.

use crate::value::Value;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a row.
pub type RowId = u64;

/// Row id reserved for rows written by index serialization.
pub const RESERVED_ROW_ID: RowId = 0;

/// First id handed out by a fresh [`RowIdAllocator`].
pub const FIRST_ROW_ID: RowId = 1;

/// Monotonic row identifier source.
///
/// One allocator is owned by each database context; there is no process-wide
/// counter.
#[derive(Debug)]
pub struct RowIdAllocator {
    next: AtomicU64,
}

impl RowIdAllocator {
    /// Creates an allocator whose first id is `first`.
    ///
    /// `first` is clamped so the reserved id is never handed out.
    pub fn new(first: RowId) -> Self {
        Self {
            next: AtomicU64::new(first.max(FIRST_ROW_ID)),
        }
    }

    /// Returns the next unique row id.
    pub fn next_id(&self) -> RowId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Reserves `count` consecutive ids and returns the first one.
    pub fn reserve(&self, count: u64) -> RowId {
        self.next.fetch_add(count, Ordering::SeqCst)
    }

    /// Makes sure ids after `id` are never reused. Called after loading
    /// persisted rows.
    pub fn observe(&self, id: RowId) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    /// Returns the id the next call to [`next_id`](Self::next_id) would produce.
    pub fn peek(&self) -> RowId {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for RowIdAllocator {
    fn default() -> Self {
        Self::new(FIRST_ROW_ID)
    }
}

/// A row in a database table.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    id: RowId,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row with the given ID and values.
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    /// Returns the row ID.
    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its payload.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gets a value at the given column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns a new row with the same id and `values` as payload.
    pub fn with_values(&self, values: Vec<Value>) -> Self {
        Self { id: self.id, values }
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The unit a backstore persists: an id plus an opaque payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistedRow {
    pub id: RowId,
    pub payload: Vec<Value>,
}

impl From<Row> for PersistedRow {
    fn from(row: Row) -> Self {
        Self {
            id: row.id,
            payload: row.values,
        }
    }
}

impl From<&Row> for PersistedRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.id,
            payload: row.values.clone(),
        }
    }
}

impl From<PersistedRow> for Row {
    fn from(row: PersistedRow) -> Self {
        Row::new(row.id, row.payload)
    }
}
