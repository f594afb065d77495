//! Filter executor.

use crate::ast::Predicate;
use crate::executor::{EntryView, Relation};

/// Filter executor - keeps the entries matching a predicate.
pub struct FilterExecutor<'a> {
    predicate: &'a Predicate,
}

impl<'a> FilterExecutor<'a> {
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    pub fn execute(&self, input: Relation) -> Relation {
        let tables = input.shared_tables();
        let entries = input
            .entries
            .into_iter()
            .filter(|entry| self.predicate.eval(&EntryView::new(&tables, entry)))
            .collect();
        Relation::new(entries, tables)
    }
}
