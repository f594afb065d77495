//! Nested Loop Join implementation.

use crate::ast::JoinPredicate;
use crate::executor::{EntryView, Relation, RelationEntry};
use alloc::vec::Vec;

/// Nested Loop Join executor.
///
/// Compares every pair of entries. The smaller input drives the outer loop;
/// the output always lists the left tables before the right ones.
pub struct NestedLoopJoin<'a> {
    predicate: &'a JoinPredicate,
}

impl<'a> NestedLoopJoin<'a> {
    /// `predicate.left` must resolve against the left input and
    /// `predicate.right` against the right one.
    pub fn new(predicate: &'a JoinPredicate) -> Self {
        Self { predicate }
    }

    pub fn execute(&self, left: Relation, right: Relation) -> Relation {
        let tables = Relation::combined_tables(&left, &right);
        let left_first = left.len() <= right.len();
        let mut entries = Vec::new();

        // Block-based nested loop for better cache behavior.
        const BLOCK_SIZE: usize = 256;
        let (outer, inner) = if left_first {
            (&left, &right)
        } else {
            (&right, &left)
        };
        for block in inner.entries.chunks(BLOCK_SIZE) {
            for outer_entry in &outer.entries {
                for inner_entry in block {
                    let (l, r) = if left_first {
                        (outer_entry, inner_entry)
                    } else {
                        (inner_entry, outer_entry)
                    };
                    if self.matches(&left, l, &right, r) {
                        entries.push(RelationEntry::combine(l, r));
                    }
                }
            }
        }
        tracing::trace!(
            outer = outer.len(),
            inner = inner.len(),
            matched = entries.len(),
            "nested loop join"
        );
        Relation::new(entries, tables)
    }

    fn matches(
        &self,
        left: &Relation,
        l: &RelationEntry,
        right: &Relation,
        r: &RelationEntry,
    ) -> bool {
        let lv = EntryView::new(left.tables(), l).get(&self.predicate.left);
        let rv = EntryView::new(right.tables(), r).get(&self.predicate.right);
        match (lv, rv) {
            (Some(lv), Some(rv)) => self.predicate.eval_values(lv, rv),
            _ => false,
        }
    }
}

/// Cartesian product of two relations, left tables first.
pub fn cross_product(left: Relation, right: Relation) -> Relation {
    let tables = Relation::combined_tables(&left, &right);
    let mut entries = Vec::with_capacity(left.len() * right.len());
    for l in &left.entries {
        for r in &right.entries {
            entries.push(RelationEntry::combine(l, r));
        }
    }
    Relation::new(entries, tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnRef, EvalType};
    use alloc::rc::Rc;
    use alloc::vec;
    use quarry_core::{DataType, Row, Value};

    fn relation(table: &str, ids: &[(u64, i64)]) -> Relation {
        let rows = ids
            .iter()
            .map(|(id, v)| Rc::new(Row::new(*id, vec![Value::Int64(*v)])))
            .collect();
        Relation::from_rows(rows, table)
    }

    fn key(table: &str) -> ColumnRef {
        ColumnRef::new(table, "k", 0, DataType::Int64)
    }

    fn pairs(rel: &Relation) -> Vec<(u64, u64)> {
        let mut out: Vec<_> = rel
            .entries
            .iter()
            .map(|e| (e.rows[0].id(), e.rows[1].id()))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_equi_join() {
        let left = relation("a", &[(1, 1), (2, 2), (3, 3)]);
        let right = relation("b", &[(10, 2), (11, 3), (12, 3), (13, 9)]);
        let pred = JoinPredicate::new(key("a"), key("b"), EvalType::Eq);
        let result = NestedLoopJoin::new(&pred).execute(left, right);
        assert_eq!(result.tables(), ["a", "b"]);
        assert_eq!(pairs(&result), vec![(2, 10), (3, 11), (3, 12)]);
    }

    #[test]
    fn test_larger_left_side_keeps_table_order() {
        let left = relation("a", &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let right = relation("b", &[(10, 3)]);
        let pred = JoinPredicate::new(key("a"), key("b"), EvalType::Lt);
        let result = NestedLoopJoin::new(&pred).execute(left, right);
        assert_eq!(result.tables(), ["a", "b"]);
        assert_eq!(pairs(&result), vec![(1, 10), (2, 10)]);
    }

    #[test]
    fn test_null_keys_never_match() {
        let left = Relation::from_rows(vec![Rc::new(Row::new(1, vec![Value::Null]))], "a");
        let right = Relation::from_rows(vec![Rc::new(Row::new(2, vec![Value::Null]))], "b");
        let pred = JoinPredicate::new(key("a"), key("b"), EvalType::Eq);
        assert!(NestedLoopJoin::new(&pred).execute(left, right).is_empty());
    }

    #[test]
    fn test_cross_product() {
        let left = relation("a", &[(1, 1), (2, 2)]);
        let right = relation("b", &[(10, 0), (11, 0), (12, 0)]);
        let result = cross_product(left, right);
        assert_eq!(result.len(), 6);
        assert_eq!(result.entries[0].rows.len(), 2);
    }
}
