//! Ordered column index.
//!
//! Keys are column values kept in a `BTreeMap`, so range reads walk the map
//! in key order. Null keys are not indexed; rows with a null key are only
//! reachable through a scan.

use crate::range::KeyRange;
use crate::stats::IndexStats;
use crate::traits::{check_key, check_range, DeserializeIndex, Index, IndexKind};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use quarry_core::schema::{IndexDef, Order};
use quarry_core::{DataType, Error, Result, Row, RowId, Value, RESERVED_ROW_ID};

/// Ordered index over one column.
#[derive(Clone, Debug)]
pub struct OrderedIndex {
    name: String,
    key_type: DataType,
    unique: bool,
    order: Order,
    map: BTreeMap<Value, Vec<RowId>>,
    stats: IndexStats,
}

impl OrderedIndex {
    /// Creates an empty index.
    pub fn new(name: impl Into<String>, key_type: DataType, unique: bool, order: Order) -> Self {
        Self {
            name: name.into(),
            key_type,
            unique,
            order,
            map: BTreeMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Creates an empty index for a schema definition.
    pub fn from_def(def: &IndexDef, key_type: DataType) -> Self {
        Self::new(def.normalized_name(), key_type, def.is_unique(), def.column().order)
    }

    /// Returns the declared key order.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns true if adding `row_id` under `key` would break uniqueness.
    pub fn would_violate(&self, key: &Value, row_id: RowId) -> bool {
        self.unique
            && !key.is_null()
            && self
                .map
                .get(key)
                .map_or(false, |ids| ids.iter().any(|id| *id != row_id))
    }

    fn entries_in<'a>(
        &'a self,
        range: &'a KeyRange<Value>,
    ) -> impl DoubleEndedIterator<Item = (&'a Value, &'a Vec<RowId>)> + 'a {
        let empty = range.is_empty();
        let iter = if empty {
            None
        } else {
            Some(self.map.range::<Value, _>(range.to_bounds()))
        };
        iter.into_iter().flatten()
    }
}

impl Index for OrderedIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Ordered
    }

    fn key_type(&self) -> DataType {
        self.key_type
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn add(&mut self, key: Value, row_id: RowId) -> Result<()> {
        if key.is_null() {
            return Ok(());
        }
        check_key(&self.name, self.key_type, &key)?;
        if self.would_violate(&key, row_id) {
            return Err(Error::unique_constraint(self.name.clone(), key));
        }

        let ids = self.map.entry(key).or_default();
        if !ids.contains(&row_id) {
            ids.push(row_id);
            self.stats.add_rows(1, row_id);
        }
        Ok(())
    }

    fn set(&mut self, key: Value, row_id: RowId) -> Result<()> {
        if key.is_null() {
            return Ok(());
        }
        check_key(&self.name, self.key_type, &key)?;
        self.remove(&key, None);
        self.add(key, row_id)
    }

    fn remove(&mut self, key: &Value, row_id: Option<RowId>) {
        let Some(ids) = self.map.get_mut(key) else {
            return;
        };
        match row_id {
            Some(row_id) => {
                let before = ids.len();
                ids.retain(|id| *id != row_id);
                self.stats.remove_rows(before - ids.len());
                if ids.is_empty() {
                    self.map.remove(key);
                }
            }
            None => {
                let removed = ids.len();
                self.map.remove(key);
                self.stats.remove_rows(removed);
            }
        }
    }

    fn get(&self, key: &Value) -> Vec<RowId> {
        self.map.get(key).cloned().unwrap_or_default()
    }

    fn get_range(
        &self,
        range: Option<&KeyRange<Value>>,
        order: Order,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<Vec<RowId>> {
        check_range(&self.name, self.key_type, range)?;
        let all = KeyRange::All;
        let range = range.unwrap_or(&all);

        let limit = limit.unwrap_or(usize::MAX);
        let ids: Vec<RowId> = match order {
            Order::Asc => self
                .entries_in(range)
                .flat_map(|(_, ids)| ids.iter().copied())
                .skip(skip)
                .take(limit)
                .collect(),
            Order::Desc => self
                .entries_in(range)
                .rev()
                .flat_map(|(_, ids)| ids.iter().copied())
                .skip(skip)
                .take(limit)
                .collect(),
        };
        Ok(ids)
    }

    fn cost(&self, range: Option<&KeyRange<Value>>) -> usize {
        match range {
            None | Some(KeyRange::All) => self.len(),
            Some(range) => {
                if check_range(&self.name, self.key_type, Some(range)).is_err() {
                    return self.len();
                }
                self.entries_in(range).map(|(_, ids)| ids.len()).sum()
            }
        }
    }

    fn contains_key(&self, key: &Value) -> bool {
        self.map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.stats.total_rows()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.stats.clear();
    }

    fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Row 0 carries the index metadata, then one row per key/row-id pair.
    fn serialize(&self) -> Vec<Row> {
        let order = match self.order {
            Order::Asc => "asc",
            Order::Desc => "desc",
        };
        let mut rows = Vec::with_capacity(self.len() + 1);
        rows.push(Row::new(
            RESERVED_ROW_ID,
            alloc::vec![
                Value::String(self.key_type.name().into()),
                Value::Boolean(self.unique),
                Value::String(order.into()),
            ],
        ));

        let pairs = self
            .map
            .iter()
            .flat_map(|(key, ids)| ids.iter().map(move |id| (key, *id)));
        for (position, (key, id)) in pairs.enumerate() {
            rows.push(Row::new(
                position as RowId + 1,
                alloc::vec![key.clone(), Value::Int64(id as i64)],
            ));
        }
        rows
    }
}

impl DeserializeIndex for OrderedIndex {
    fn deserialize(name: &str, rows: &[Row]) -> Result<Self> {
        let meta = rows
            .iter()
            .find(|r| r.id() == RESERVED_ROW_ID)
            .ok_or_else(|| Error::data(format!("index {}: missing metadata row", name)))?;

        let bad_meta = || Error::data(format!("index {}: malformed metadata row", name));
        let key_type = meta
            .get(0)
            .and_then(Value::as_str)
            .and_then(DataType::from_name)
            .ok_or_else(bad_meta)?;
        let unique = meta.get(1).and_then(Value::as_bool).ok_or_else(bad_meta)?;
        let order = match meta.get(2).and_then(Value::as_str) {
            Some("asc") => Order::Asc,
            Some("desc") => Order::Desc,
            _ => return Err(bad_meta()),
        };

        let mut index = OrderedIndex::new(name, key_type, unique, order);
        for row in rows.iter().filter(|r| r.id() != RESERVED_ROW_ID) {
            let (key, id) = match row.values() {
                [key, Value::Int64(id)] if *id >= 0 => (key.clone(), *id as RowId),
                _ => {
                    return Err(Error::data(format!(
                        "index {}: malformed entry row {}",
                        name,
                        row.id()
                    )))
                }
            };
            index.add(key, id)?;
        }
        Ok(index)
    }
}
