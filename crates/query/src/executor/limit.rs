//! Limit executor.

use crate::executor::Relation;

/// Limit executor - applies LIMIT and SKIP to a relation.
pub struct LimitExecutor {
    limit: usize,
    offset: usize,
}

impl LimitExecutor {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Creates a limit executor with only a limit (no offset).
    pub fn limit_only(limit: usize) -> Self {
        Self::new(limit, 0)
    }

    /// Creates an executor that only drops the first `offset` entries.
    pub fn skip_only(offset: usize) -> Self {
        Self::new(usize::MAX, offset)
    }

    /// Keeps entries `offset..offset + limit`, in input order.
    pub fn execute(&self, mut input: Relation) -> Relation {
        let len = input.entries.len();
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(self.limit).min(len);

        // Truncate tail first (drops elements after end)
        input.entries.truncate(end);
        if start > 0 {
            input.entries.drain(..start);
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use quarry_core::{Row, Value};

    fn input(n: u64) -> Relation {
        let rows = (0..n)
            .map(|i| Rc::new(Row::new(i, vec![Value::Int64(i as i64)])))
            .collect();
        Relation::from_rows(rows, "t")
    }

    fn ids(rel: &Relation) -> Vec<u64> {
        rel.entries.iter().map(|e| e.rows[0].id()).collect()
    }

    #[test]
    fn test_limit_executor() {
        let result = LimitExecutor::new(3, 2).execute(input(10));
        assert_eq!(ids(&result), vec![2, 3, 4]);
    }

    #[test]
    fn test_limit_only() {
        let result = LimitExecutor::limit_only(5).execute(input(10));
        assert_eq!(ids(&result), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_skip_only() {
        let result = LimitExecutor::skip_only(8).execute(input(10));
        assert_eq!(ids(&result), vec![8, 9]);
    }

    #[test]
    fn test_limit_zero() {
        assert!(LimitExecutor::limit_only(0).execute(input(3)).is_empty());
    }

    #[test]
    fn test_limit_exceeds_size() {
        assert_eq!(LimitExecutor::new(100, 0).execute(input(2)).len(), 2);
    }

    #[test]
    fn test_offset_exceeds_size() {
        assert!(LimitExecutor::new(10, 100).execute(input(2)).is_empty());
    }
}
