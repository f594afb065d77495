//! Database configuration.

use quarry_core::schema::Table;
use quarry_core::{Error, Result, RowId, FIRST_ROW_ID, RESERVED_ROW_ID};
use serde::{Deserialize, Serialize};

/// Options fixed when a database is opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Overrides every table's `persistent_index` flag when set.
    pub persist_indices_on_commit: Option<bool>,
    /// First row id handed out when the backstore holds no rows.
    pub first_row_id: RowId,
    /// Emit the optimized plan of every select at `debug`.
    pub log_plans: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            persist_indices_on_commit: None,
            first_row_id: FIRST_ROW_ID,
            log_plans: false,
        }
    }
}

impl DatabaseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persist_indices_on_commit(mut self, value: bool) -> Self {
        self.persist_indices_on_commit = Some(value);
        self
    }

    pub fn first_row_id(mut self, id: RowId) -> Self {
        self.first_row_id = id;
        self
    }

    pub fn log_plans(mut self, value: bool) -> Self {
        self.log_plans = value;
        self
    }

    /// Returns true if the indices of `table` are written to the backstore.
    pub fn persists_indices(&self, table: &Table) -> bool {
        self.persist_indices_on_commit
            .unwrap_or_else(|| table.persistent_index())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.first_row_id == RESERVED_ROW_ID {
            return Err(Error::invalid_operation(format!(
                "row id {} is reserved for serialized indices",
                RESERVED_ROW_ID
            )));
        }
        Ok(())
    }
}
