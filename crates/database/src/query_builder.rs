//! Query builders.
//!
//! Every builder produces a [`Query`]. `exec()` runs it in an implicit
//! transaction of its own; [`Transaction::attach`](crate::Transaction::attach)
//! runs it inside an explicit one.

use crate::context::Context;
use crate::transaction::exec_implicit;
use quarry_core::schema::{Order, Table};
use quarry_core::{Error, Result, Value};
use quarry_query::ast::{and, ColumnRef, Expr, Predicate};
use quarry_query::executor::ResultRow;
use quarry_query::query::SelectQuery;
use quarry_storage::{JournalView, TransactionType};
use std::rc::Rc;

/// Insert of whole rows, optionally replacing rows with the same primary key.
#[derive(Clone, Debug)]
pub struct InsertQuery {
    pub table: Table,
    pub rows: Vec<Vec<Value>>,
    pub or_replace: bool,
}

/// Update of column values in the rows matching a predicate.
#[derive(Clone, Debug)]
pub struct UpdateQuery {
    pub table: Table,
    pub sets: Vec<(ColumnRef, Value)>,
    pub where_clause: Option<Predicate>,
}

/// Delete of the rows matching a predicate.
#[derive(Clone, Debug)]
pub struct DeleteQuery {
    pub table: Table,
    pub where_clause: Option<Predicate>,
}

/// Any query a transaction can run.
#[derive(Clone, Debug)]
pub enum Query {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

impl Query {
    /// The transaction type this query needs.
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Query::Select(_) => TransactionType::ReadOnly,
            _ => TransactionType::ReadWrite,
        }
    }

    /// The table a write query modifies.
    pub fn target(&self) -> Option<&Table> {
        match self {
            Query::Select(_) => None,
            Query::Insert(q) => Some(&q.table),
            Query::Update(q) => Some(&q.table),
            Query::Delete(q) => Some(&q.table),
        }
    }

    fn where_clause(&self) -> Option<&Predicate> {
        match self {
            Query::Select(q) => q.where_clause.as_ref(),
            Query::Insert(_) => None,
            Query::Update(q) => q.where_clause.as_ref(),
            Query::Delete(q) => q.where_clause.as_ref(),
        }
    }

    /// Returns true if every placeholder has a value.
    pub fn is_bound(&self) -> bool {
        self.where_clause().map_or(true, Predicate::is_bound)
    }

    /// Checks the query can run: well formed and fully bound.
    pub fn check(&self) -> Result<()> {
        match self {
            Query::Select(q) => q.validate()?,
            Query::Insert(q) => {
                if q.or_replace && q.table.primary_key().is_none() {
                    return Err(Error::syntax(format!(
                        "insert or replace into {} requires a primary key",
                        q.table.name()
                    )));
                }
            }
            Query::Update(q) => {
                for (column, _) in &q.sets {
                    check_target(&q.table, column)?;
                }
                check_where(&q.table, q.where_clause.as_ref())?;
            }
            Query::Delete(q) => check_where(&q.table, q.where_clause.as_ref())?,
        }
        match self.where_clause() {
            Some(pred) if !pred.is_bound() => Err(Error::syntax(format!(
                "query has {} unbound placeholder(s)",
                pred.param_count()
            ))),
            _ => Ok(()),
        }
    }
}

fn check_target(table: &Table, column: &ColumnRef) -> Result<()> {
    let owned = column.table == table.effective_name()
        && table.columns().get(column.index).map(|c| c.name()) == Some(column.column.as_str());
    if owned {
        Ok(())
    } else {
        Err(Error::syntax(format!(
            "column {} does not belong to {}",
            column.normalized_name(),
            table.name()
        )))
    }
}

fn check_where(table: &Table, predicate: Option<&Predicate>) -> Result<()> {
    let Some(predicate) = predicate else {
        return Ok(());
    };
    for column in predicate.columns() {
        check_target(table, column)?;
    }
    predicate.validate()
}

/// Binds a where clause, reporting rejected values.
fn bind_where(predicate: Option<&Predicate>, values: &[Value]) -> Result<Option<Predicate>> {
    let result = match predicate {
        Some(pred) => pred.bind(values).map(Some),
        None if values.is_empty() => Ok(None),
        None => Err(Error::syntax(format!(
            "query has no placeholders, got {} bound values",
            values.len()
        ))),
    };
    if let Err(err) = &result {
        tracing::warn!(error = %err, "bind rejected");
    }
    result
}

fn and_where(existing: Option<Predicate>, predicate: Predicate) -> Option<Predicate> {
    Some(match existing {
        Some(existing) => and(vec![existing, predicate]),
        None => predicate,
    })
}

/// SELECT query builder.
#[derive(Clone)]
pub struct SelectBuilder {
    ctx: Rc<Context>,
    query: SelectQuery,
}

impl SelectBuilder {
    pub(crate) fn new(ctx: Rc<Context>, columns: Vec<Expr>) -> Self {
        Self {
            ctx,
            query: SelectQuery {
                columns,
                ..SelectQuery::default()
            },
        }
    }

    /// Adds tables to the from list.
    pub fn from(mut self, tables: &[&Table]) -> Self {
        self.query.from.extend(tables.iter().map(|t| (*t).clone()));
        self
    }

    /// Adds `table` and ANDs the join condition into the where clause.
    pub fn inner_join(mut self, table: &Table, on: Predicate) -> Self {
        self.query.from.push(table.clone());
        self.query.where_clause = and_where(self.query.where_clause.take(), on);
        self
    }

    /// Sets or extends the where clause. Repeated calls are ANDed.
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.query.where_clause = and_where(self.query.where_clause.take(), predicate);
        self
    }

    pub fn order_by(mut self, column: &ColumnRef, order: Order) -> Self {
        self.query.order_by.push((column.clone(), order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.query.skip = Some(n);
        self
    }

    pub fn group_by(mut self, columns: &[&ColumnRef]) -> Self {
        self.query.group_by.extend(columns.iter().map(|c| (*c).clone()));
        self
    }

    /// Returns a copy with every placeholder resolved from `values`.
    pub fn bind(&self, values: &[Value]) -> Result<Self> {
        let query = self.query.bind(values).map_err(|err| {
            tracing::warn!(error = %err, "bind rejected");
            err
        })?;
        Ok(Self {
            ctx: self.ctx.clone(),
            query,
        })
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    /// Renders the optimized logical plan and the physical plan against the
    /// committed data.
    pub fn explain(&self) -> Result<String> {
        let cache = self.ctx.cache.borrow();
        self.ctx
            .planner
            .explain(&self.query, &JournalView::committed(&cache))
    }

    pub async fn exec(&self) -> Result<Vec<ResultRow>> {
        exec_implicit(self.ctx.clone(), Query::Select(self.query.clone())).await
    }
}

/// INSERT and INSERT OR REPLACE query builder.
#[derive(Clone)]
pub struct InsertBuilder {
    ctx: Rc<Context>,
    query: InsertQuery,
}

impl InsertBuilder {
    pub(crate) fn new(ctx: Rc<Context>, table: &Table, or_replace: bool) -> Self {
        Self {
            ctx,
            query: InsertQuery {
                table: table.clone(),
                rows: Vec::new(),
                or_replace,
            },
        }
    }

    /// Adds row payloads, one value per column in schema order. Numeric
    /// values are widened to their column's type.
    pub fn values(mut self, rows: Vec<Vec<Value>>) -> Self {
        let columns = self.query.table.columns();
        self.query.rows.extend(rows.into_iter().map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(i, value)| match columns.get(i) {
                    Some(column) => value.widen_to(column.data_type()),
                    None => value,
                })
                .collect::<Vec<_>>()
        }));
        self
    }

    pub fn query(&self) -> &InsertQuery {
        &self.query
    }

    pub async fn exec(&self) -> Result<Vec<ResultRow>> {
        exec_implicit(self.ctx.clone(), Query::Insert(self.query.clone())).await
    }
}

/// UPDATE query builder.
#[derive(Clone)]
pub struct UpdateBuilder {
    ctx: Rc<Context>,
    query: UpdateQuery,
}

impl UpdateBuilder {
    pub(crate) fn new(ctx: Rc<Context>, table: &Table) -> Self {
        Self {
            ctx,
            query: UpdateQuery {
                table: table.clone(),
                sets: Vec::new(),
                where_clause: None,
            },
        }
    }

    /// Assigns `value` to `column`, widened to the column's type.
    pub fn set(mut self, column: &ColumnRef, value: impl Into<Value>) -> Self {
        let value = value.into().widen_to(column.data_type);
        self.query.sets.push((column.clone(), value));
        self
    }

    /// Sets or extends the where clause. Repeated calls are ANDed.
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.query.where_clause = and_where(self.query.where_clause.take(), predicate);
        self
    }

    pub fn bind(&self, values: &[Value]) -> Result<Self> {
        let mut query = self.query.clone();
        query.where_clause = bind_where(self.query.where_clause.as_ref(), values)?;
        Ok(Self {
            ctx: self.ctx.clone(),
            query,
        })
    }

    pub fn query(&self) -> &UpdateQuery {
        &self.query
    }

    pub async fn exec(&self) -> Result<Vec<ResultRow>> {
        exec_implicit(self.ctx.clone(), Query::Update(self.query.clone())).await
    }
}

/// DELETE query builder.
#[derive(Clone)]
pub struct DeleteBuilder {
    ctx: Rc<Context>,
    query: DeleteQuery,
}

impl DeleteBuilder {
    pub(crate) fn new(ctx: Rc<Context>, table: &Table) -> Self {
        Self {
            ctx,
            query: DeleteQuery {
                table: table.clone(),
                where_clause: None,
            },
        }
    }

    /// Sets or extends the where clause. Repeated calls are ANDed.
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.query.where_clause = and_where(self.query.where_clause.take(), predicate);
        self
    }

    pub fn bind(&self, values: &[Value]) -> Result<Self> {
        let mut query = self.query.clone();
        query.where_clause = bind_where(self.query.where_clause.as_ref(), values)?;
        Ok(Self {
            ctx: self.ctx.clone(),
            query,
        })
    }

    pub fn query(&self) -> &DeleteQuery {
        &self.query
    }

    pub async fn exec(&self) -> Result<Vec<ResultRow>> {
        exec_implicit(self.ctx.clone(), Query::Delete(self.query.clone())).await
    }
}

impl From<SelectBuilder> for Query {
    fn from(builder: SelectBuilder) -> Self {
        Query::Select(builder.query)
    }
}

impl From<InsertBuilder> for Query {
    fn from(builder: InsertBuilder) -> Self {
        Query::Insert(builder.query)
    }
}

impl From<UpdateBuilder> for Query {
    fn from(builder: UpdateBuilder) -> Self {
        Query::Update(builder.query)
    }
}

impl From<DeleteBuilder> for Query {
    fn from(builder: DeleteBuilder) -> Self {
        Query::Delete(builder.query)
    }
}

impl From<SelectQuery> for Query {
    fn from(query: SelectQuery) -> Self {
        Query::Select(query)
    }
}
