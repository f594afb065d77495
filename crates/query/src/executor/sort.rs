//! Sort executor.

use crate::ast::ColumnRef;
use crate::executor::{EntryView, Relation};
use alloc::vec::Vec;
use quarry_core::schema::Order;
use quarry_core::Value;
use quarry_index::{Comparator, MultiKeyComparator};

/// Sort executor - stable multi-key sort.
///
/// Entries compare on the first key, ties fall through to the next key, and
/// entries equal on every key keep their input order. Nulls sort first in
/// ascending order.
pub struct SortExecutor<'a> {
    order_by: &'a [(ColumnRef, Order)],
}

impl<'a> SortExecutor<'a> {
    pub fn new(order_by: &'a [(ColumnRef, Order)]) -> Self {
        Self { order_by }
    }

    pub fn execute(&self, input: Relation) -> Relation {
        let tables = input.shared_tables();
        let comparator =
            MultiKeyComparator::new(self.order_by.iter().map(|(_, order)| *order).collect());

        let mut keyed: Vec<(Vec<Value>, _)> = input
            .entries
            .into_iter()
            .map(|entry| {
                let view = EntryView::new(&tables, &entry);
                let key = self
                    .order_by
                    .iter()
                    .map(|(col, _)| view.get(col).cloned().unwrap_or(Value::Null))
                    .collect();
                (key, entry)
            })
            .collect();
        // `sort_by` is stable.
        keyed.sort_by(|(a, _), (b, _)| comparator.compare(a.as_slice(), b.as_slice()));

        Relation::new(keyed.into_iter().map(|(_, e)| e).collect(), tables)
    }
}
