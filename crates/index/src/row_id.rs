//! The row-identifier index.
//!
//! A degenerate index whose keys are the row ids themselves. It is an
//! unordered membership set: ordering only happens when a range is read.

use crate::range::KeyRange;
use crate::stats::IndexStats;
use crate::traits::{slice, DeserializeIndex, Index, IndexKind};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use quarry_core::schema::Order;
use quarry_core::{DataType, Error, Result, Row, RowId, Value, RESERVED_ROW_ID};

/// Index over the row ids of one table.
#[derive(Clone, Debug)]
pub struct RowIdIndex {
    name: String,
    rows: HashSet<RowId>,
    stats: IndexStats,
}

impl RowIdIndex {
    /// Creates an empty index named `name` (conventionally `"<table>.#"`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: HashSet::new(),
            stats: IndexStats::new(),
        }
    }

    /// Returns every row id, in no particular order.
    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().copied()
    }

    fn to_row_id(&self, key: &Value) -> Result<RowId> {
        let id = match key {
            Value::Int64(v) => *v,
            Value::Int32(v) => i64::from(*v),
            other => {
                return Err(Error::data(format!(
                    "row id index {} requires integer keys, got {:?}",
                    self.name, other
                )))
            }
        };
        RowId::try_from(id)
            .map_err(|_| Error::data(format!("row id index {}: negative key {}", self.name, id)))
    }

    fn to_bound(&self, key: &Value) -> Result<i64> {
        match key {
            Value::Int64(v) => Ok(*v),
            Value::Int32(v) => Ok(i64::from(*v)),
            other => Err(Error::data(format!(
                "row id index {}: range bound {:?} is not an integer",
                self.name, other
            ))),
        }
    }

    /// Converts a `Value` range into an `i64` range, validating bound types.
    fn to_id_range(&self, range: &KeyRange<Value>) -> Result<KeyRange<i64>> {
        Ok(match range {
            KeyRange::All => KeyRange::All,
            KeyRange::Only(k) => KeyRange::Only(self.to_bound(k)?),
            KeyRange::LowerBound { value, exclusive } => {
                KeyRange::lower_bound(self.to_bound(value)?, *exclusive)
            }
            KeyRange::UpperBound { value, exclusive } => {
                KeyRange::upper_bound(self.to_bound(value)?, *exclusive)
            }
            KeyRange::Bound {
                lower,
                upper,
                lower_exclusive,
                upper_exclusive,
            } => KeyRange::bound(
                self.to_bound(lower)?,
                self.to_bound(upper)?,
                *lower_exclusive,
                *upper_exclusive,
            ),
        })
    }
}

impl Index for RowIdIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexKind {
        IndexKind::RowId
    }

    fn key_type(&self) -> DataType {
        DataType::Int64
    }

    fn is_unique(&self) -> bool {
        true
    }

    fn add(&mut self, key: Value, _row_id: RowId) -> Result<()> {
        let id = self.to_row_id(&key)?;
        if self.rows.insert(id) {
            self.stats.add_rows(1, id);
        }
        Ok(())
    }

    fn set(&mut self, key: Value, row_id: RowId) -> Result<()> {
        self.remove(&key, None);
        self.add(key, row_id)
    }

    fn remove(&mut self, key: &Value, _row_id: Option<RowId>) {
        if let Ok(id) = self.to_row_id(key) {
            if self.rows.remove(&id) {
                self.stats.remove_rows(1);
            }
        }
    }

    fn get(&self, key: &Value) -> Vec<RowId> {
        match self.to_row_id(key) {
            Ok(id) if self.rows.contains(&id) => alloc::vec![id],
            _ => Vec::new(),
        }
    }

    fn get_range(
        &self,
        range: Option<&KeyRange<Value>>,
        order: Order,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<Vec<RowId>> {
        let range = match range {
            Some(range) => self.to_id_range(range)?,
            None => KeyRange::All,
        };

        let mut ids: Vec<RowId> = self
            .rows
            .iter()
            .copied()
            .filter(|id| i64::try_from(*id).map_or(false, |k| range.contains(&k)))
            .collect();
        ids.sort_unstable_by(|a, b| order.apply(a.cmp(b)));
        Ok(slice(ids, limit, skip))
    }

    /// Always the full cardinality, so any column index wins over this one.
    fn cost(&self, _range: Option<&KeyRange<Value>>) -> usize {
        self.rows.len()
    }

    fn contains_key(&self, key: &Value) -> bool {
        self.to_row_id(key)
            .map_or(false, |id| self.rows.contains(&id))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.stats.clear();
    }

    fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// The whole key set becomes one row with the reserved id.
    fn serialize(&self) -> Vec<Row> {
        let mut ids: Vec<RowId> = self.rows.iter().copied().collect();
        ids.sort_unstable();
        let payload = ids.into_iter().map(|id| Value::Int64(id as i64)).collect();
        alloc::vec![Row::new(RESERVED_ROW_ID, payload)]
    }
}

impl DeserializeIndex for RowIdIndex {
    fn deserialize(name: &str, rows: &[Row]) -> Result<Self> {
        let mut index = RowIdIndex::new(name);
        for row in rows {
            if row.id() != RESERVED_ROW_ID {
                return Err(Error::data(format!(
                    "row id index {}: unexpected persisted row {}",
                    name,
                    row.id()
                )));
            }
            for key in row.values() {
                index.add(key.clone(), 0)?;
            }
        }
        Ok(index)
    }
}
