//! Aggregate executor.

use crate::ast::{AggregateExpr, AggregateFunc, ColumnRef, RowSource};
use crate::executor::{EntryView, Relation, RelationEntry};
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use libm::sqrt;
use quarry_core::{DataType, Value};

/// Aggregate executor - groups entries and computes aggregate values.
///
/// Every output entry keeps the rows of the first entry of its group, so
/// group-by columns stay readable, and carries one value per aggregate.
pub struct AggregateExecutor<'a> {
    group_by: &'a [ColumnRef],
    aggregates: &'a [AggregateExpr],
}

impl<'a> AggregateExecutor<'a> {
    pub fn new(group_by: &'a [ColumnRef], aggregates: &'a [AggregateExpr]) -> Self {
        Self {
            group_by,
            aggregates,
        }
    }

    pub fn execute(&self, input: Relation) -> Relation {
        let tables = input.shared_tables();

        if let [agg] = self.aggregates {
            if agg.func == AggregateFunc::Distinct && self.group_by.is_empty() {
                if let Some(column) = &agg.column {
                    return self.distinct(input, column);
                }
            }
        }

        if self.group_by.is_empty() {
            // No grouping: one entry even for empty input.
            let entries: Vec<&RelationEntry> = input.entries.iter().collect();
            let mut entry = entries.first().map(|e| (*e).clone()).unwrap_or_default();
            entry.aggregates = self.compute(&input, &entries);
            return Relation::new(alloc::vec![entry], tables);
        }

        let mut slots: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&RelationEntry>> = Vec::new();
        for entry in &input.entries {
            let view = input.view(entry);
            let key: Vec<Value> = self
                .group_by
                .iter()
                .map(|col| view.value(col).cloned().unwrap_or(Value::Null))
                .collect();
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(entry);
        }

        let entries = groups
            .iter()
            .filter_map(|group| {
                let mut entry = (*group.first()?).clone();
                entry.aggregates = self.compute(&input, group);
                Some(entry)
            })
            .collect();
        Relation::new(entries, tables)
    }

    fn distinct(&self, input: Relation, column: &ColumnRef) -> Relation {
        let tables = input.shared_tables();
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for entry in input.entries {
            let value = EntryView::new(&tables, &entry)
                .value(column)
                .cloned()
                .unwrap_or(Value::Null);
            if seen.insert(value.clone()) {
                entries.push(RelationEntry {
                    rows: entry.rows,
                    aggregates: alloc::vec![value],
                });
            }
        }
        Relation::new(entries, tables)
    }

    fn compute(&self, input: &Relation, entries: &[&RelationEntry]) -> Vec<Value> {
        self.aggregates
            .iter()
            .map(|agg| match &agg.column {
                None => Value::Int64(entries.len() as i64),
                Some(column) => {
                    let mut values: Vec<&Value> = entries
                        .iter()
                        .filter_map(|e| input.view(e).get(column))
                        .filter(|v| !v.is_null())
                        .collect();
                    if agg.distinct {
                        let mut seen = HashSet::new();
                        values.retain(|v| seen.insert(*v));
                    }
                    aggregate(agg.func, column.data_type, &values)
                }
            })
            .collect()
    }
}

/// Applies `func` to the non-null `values` of a column.
fn aggregate(func: AggregateFunc, data_type: DataType, values: &[&Value]) -> Value {
    let numbers = || values.iter().filter_map(|v| v.to_f64());
    match func {
        AggregateFunc::Count => Value::Int64(values.len() as i64),
        _ if values.is_empty() => Value::Null,
        AggregateFunc::Sum if data_type == DataType::Float64 => Value::Float64(numbers().sum()),
        // Integer sums that overflow are reported as floats.
        AggregateFunc::Sum => values
            .iter()
            .filter_map(|v| v.as_i64().or_else(|| v.as_i32().map(i64::from)))
            .try_fold(0i64, i64::checked_add)
            .map_or_else(|| Value::Float64(numbers().sum()), Value::Int64),
        AggregateFunc::Avg => Value::Float64(numbers().sum::<f64>() / values.len() as f64),
        AggregateFunc::Min => values.iter().min().map(|v| (*v).clone()).unwrap_or(Value::Null),
        AggregateFunc::Max => values.iter().max().map(|v| (*v).clone()).unwrap_or(Value::Null),
        AggregateFunc::StdDev => {
            let n = values.len() as f64;
            let mean = numbers().sum::<f64>() / n;
            let variance = numbers().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            Value::Float64(sqrt(variance))
        }
        // Only valid on its own, handled by `distinct`.
        AggregateFunc::Distinct => Value::Null,
    }
}
