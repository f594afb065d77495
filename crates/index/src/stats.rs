//! Index statistics.

use quarry_core::RowId;

/// Statistics for an index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Total number of row ids in the index.
    total_rows: usize,
    /// Largest row id ever added.
    max_key_encountered: RowId,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of rows.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Returns the largest row id encountered.
    pub fn max_key_encountered(&self) -> RowId {
        self.max_key_encountered
    }

    /// Records `count` added rows, the largest being `max_row_id`.
    pub fn add_rows(&mut self, count: usize, max_row_id: RowId) {
        self.total_rows += count;
        self.max_key_encountered = self.max_key_encountered.max(max_row_id);
    }

    /// Records `count` removed rows.
    pub fn remove_rows(&mut self, count: usize) {
        self.total_rows = self.total_rows.saturating_sub(count);
    }

    /// Resets the row count. The max key is kept so ids are never reissued.
    pub fn clear(&mut self) {
        self.total_rows = 0;
    }
}
