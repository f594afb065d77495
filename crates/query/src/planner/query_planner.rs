//! Query planner: the full pipeline from a select query to result rows.
//!
//! 1. **Validation** - schema checks and placeholder binding state
//! 2. **Logical plan** - the naive tree from [`LogicalPlanBuilder`]
//! 3. **Rewrite** - the [`Optimizer`] passes, in order
//! 4. **Physical plan** - access paths chosen by [`PhysicalPlanGenerator`]
//! 5. **Execution** - [`PhysicalPlanRunner`] against a [`DataSource`]

use crate::ast::Predicate;
use crate::executor::{DataSource, PhysicalPlanRunner, ResultRow};
use crate::optimizer::Optimizer;
use crate::planner::logical::{explain, LogicalPlan, LogicalPlanBuilder};
use crate::planner::physical::{explain_physical, PhysicalPlan, PhysicalPlanGenerator};
use crate::query::SelectQuery;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use quarry_core::schema::Table;
use quarry_core::{Error, Result, Row};

/// Plans and executes select queries.
#[derive(Default)]
pub struct QueryPlanner {
    optimizer: Optimizer,
}

impl QueryPlanner {
    /// Creates a planner with the default rewrite passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner with a custom optimizer, e.g. one without passes
    /// to execute the naive plan.
    pub fn with_optimizer(optimizer: Optimizer) -> Self {
        Self { optimizer }
    }

    /// Returns the rewritten logical plan of `query`.
    pub fn logical(&self, query: &SelectQuery) -> LogicalPlan {
        self.optimizer.optimize(LogicalPlanBuilder::build(query))
    }

    /// Validates `query` and builds its physical plan.
    pub fn plan<D: DataSource + ?Sized>(
        &self,
        query: &SelectQuery,
        source: &D,
    ) -> Result<PhysicalPlan> {
        query.validate()?;
        if !query.is_bound() {
            return Err(Error::syntax(format!(
                "query has {} unbound placeholder(s)",
                query.param_count()
            )));
        }
        let logical = self.logical(query);
        let physical = PhysicalPlanGenerator::new(source).generate(&logical)?;
        tracing::trace!(
            logical = %explain(&logical),
            physical = %explain_physical(&physical),
            "planned select"
        );
        Ok(physical)
    }

    /// Executes `query` and returns its result rows.
    pub fn execute<D: DataSource + ?Sized>(
        &self,
        query: &SelectQuery,
        source: &D,
    ) -> Result<Vec<ResultRow>> {
        let plan = self.plan(query, source)?;
        let rows = PhysicalPlanRunner::new(source).run(&plan)?;
        tracing::debug!(
            tables = ?query.table_names(),
            rows = rows.len(),
            "select executed"
        );
        Ok(rows)
    }

    /// Returns the rows of `table` matching `predicate`, every row when
    /// there is none. Used by update and delete.
    pub fn matching_rows<D: DataSource + ?Sized>(
        &self,
        table: &Table,
        predicate: Option<&Predicate>,
        source: &D,
    ) -> Result<Vec<Rc<Row>>> {
        let query = SelectQuery {
            from: alloc::vec![table.clone()],
            where_clause: predicate.cloned(),
            ..SelectQuery::default()
        };
        let plan = self.plan(&query, source)?;
        let relation = PhysicalPlanRunner::new(source).input(&plan)?;
        Ok(relation
            .entries
            .into_iter()
            .filter_map(|entry| entry.rows.into_iter().next())
            .collect())
    }

    /// Renders the rewritten logical plan and the physical plan of `query`.
    pub fn explain<D: DataSource + ?Sized>(
        &self,
        query: &SelectQuery,
        source: &D,
    ) -> Result<String> {
        let physical = self.plan(query, source)?;
        Ok(format!(
            "{}\n{}",
            explain(&self.logical(query)),
            explain_physical(&physical)
        ))
    }
}
