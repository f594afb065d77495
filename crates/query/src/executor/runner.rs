//! Physical plan runner - executes physical query plans.
//!
//! The runner evaluates plan nodes depth-first: every node executes its
//! children, then combines their relations with the matching executor.

use crate::executor::join::{cross_product, NestedLoopJoin};
use crate::executor::{
    AggregateExecutor, FilterExecutor, LimitExecutor, ProjectExecutor, Relation, ResultRow,
    SortExecutor,
};
use crate::planner::{NodeId, PhysicalNode, PhysicalPlan};
use alloc::format;
use alloc::vec::Vec;
use quarry_core::schema::Order;
use quarry_core::{Error, Result};
use quarry_storage::{JournalView, RowStore, TableCache};

/// Where a plan reads its rows from.
pub trait DataSource {
    /// Returns the store for table `table` (the schema name, not an alias).
    fn store(&self, table: &str) -> Option<&RowStore>;
}

impl DataSource for TableCache {
    fn store(&self, table: &str) -> Option<&RowStore> {
        self.get_table(table)
    }
}

impl DataSource for JournalView<'_> {
    fn store(&self, table: &str) -> Option<&RowStore> {
        self.table(table)
    }
}

/// Physical plan runner.
pub struct PhysicalPlanRunner<'a, D: DataSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DataSource + ?Sized> PhysicalPlanRunner<'a, D> {
    pub fn new(source: &'a D) -> Self {
        Self { source }
    }

    /// Runs a whole plan; the root must be a projection.
    pub fn run(&self, plan: &PhysicalPlan) -> Result<Vec<ResultRow>> {
        match plan.get(plan.root()) {
            PhysicalNode::Project { columns, qualify } => {
                let input = self.input(plan)?;
                Ok(ProjectExecutor::new(columns, *qualify).execute(input))
            }
            other => Err(Error::invalid_operation(format!(
                "plan root must be a projection, found {}",
                other
            ))),
        }
    }

    /// Executes everything below the root projection.
    pub fn input(&self, plan: &PhysicalPlan) -> Result<Relation> {
        self.execute(plan, self.only_child(plan, plan.root())?)
    }

    /// Executes the subtree at `id` and returns its relation.
    pub fn execute(&self, plan: &PhysicalPlan, id: NodeId) -> Result<Relation> {
        match plan.get(id) {
            PhysicalNode::TableScan { table } => {
                let store = self.store(table.name())?;
                Ok(Relation::from_rows(store.scan().collect(), table.effective_name()))
            }
            PhysicalNode::IndexRangeScan {
                table,
                index,
                ranges,
            } => {
                let store = self.store(table.name())?;
                let mut rows = Vec::new();
                for range in ranges {
                    rows.extend(store.index_scan(index, Some(range), Order::Asc, None, 0)?);
                }
                Ok(Relation::from_rows(rows, table.effective_name()))
            }
            PhysicalNode::Select { predicate } => {
                let input = self.execute(plan, self.only_child(plan, id)?)?;
                Ok(FilterExecutor::new(predicate).execute(input))
            }
            PhysicalNode::CrossProduct => {
                let mut inputs = plan.children(id).iter();
                let first = inputs.next().ok_or_else(|| {
                    Error::invalid_operation("cross product without inputs")
                })?;
                let mut relation = self.execute(plan, *first)?;
                for child in inputs {
                    relation = cross_product(relation, self.execute(plan, *child)?);
                }
                Ok(relation)
            }
            PhysicalNode::NestedLoopJoin { predicate } => {
                let (left, right) = self.binary(plan, id)?;
                Ok(NestedLoopJoin::new(predicate).execute(left, right))
            }
            PhysicalNode::Aggregate {
                group_by,
                aggregates,
            } => {
                let input = self.execute(plan, self.only_child(plan, id)?)?;
                Ok(AggregateExecutor::new(group_by, aggregates).execute(input))
            }
            PhysicalNode::OrderBy { order_by } => {
                let input = self.execute(plan, self.only_child(plan, id)?)?;
                Ok(SortExecutor::new(order_by).execute(input))
            }
            PhysicalNode::Skip { count } => {
                let input = self.execute(plan, self.only_child(plan, id)?)?;
                Ok(LimitExecutor::skip_only(*count).execute(input))
            }
            PhysicalNode::Limit { count } => {
                let input = self.execute(plan, self.only_child(plan, id)?)?;
                Ok(LimitExecutor::limit_only(*count).execute(input))
            }
            PhysicalNode::Project { .. } => {
                Err(Error::invalid_operation("projection below the plan root"))
            }
        }
    }

    fn store(&self, table: &str) -> Result<&'a RowStore> {
        self.source
            .store(table)
            .ok_or_else(|| Error::table_not_found(table))
    }

    fn only_child(&self, plan: &PhysicalPlan, id: NodeId) -> Result<NodeId> {
        match plan.children(id) {
            [child] => Ok(*child),
            children => Err(Error::invalid_operation(format!(
                "{} expects 1 input, has {}",
                plan.get(id),
                children.len()
            ))),
        }
    }

    fn binary(&self, plan: &PhysicalPlan, id: NodeId) -> Result<(Relation, Relation)> {
        match plan.children(id) {
            [left, right] => Ok((self.execute(plan, *left)?, self.execute(plan, *right)?)),
            children => Err(Error::invalid_operation(format!(
                "{} expects 2 inputs, has {}",
                plan.get(id),
                children.len()
            ))),
        }
    }
}
