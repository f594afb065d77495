//! Select query description consumed by the planner.

use crate::ast::{AggregateFunc, ColumnRef, Expr, Predicate};
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use quarry_core::schema::{Order, Table};
use quarry_core::{Error, Result, Value};

/// Structured form of a select query.
#[derive(Clone, Debug, Default)]
pub struct SelectQuery {
    pub from: Vec<Table>,
    pub where_clause: Option<Predicate>,
    pub order_by: Vec<(ColumnRef, Order)>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    /// Empty means every column of every table.
    pub columns: Vec<Expr>,
    pub group_by: Vec<ColumnRef>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if rows are keyed by table in the result.
    pub fn is_multi_table(&self) -> bool {
        self.from.len() > 1
    }

    /// Effective names of the tables in `from`.
    pub fn table_names(&self) -> Vec<&str> {
        self.from.iter().map(Table::effective_name).collect()
    }

    /// Number of bind slots the query expects.
    pub fn param_count(&self) -> usize {
        self.where_clause
            .as_ref()
            .map(Predicate::param_count)
            .unwrap_or(0)
    }

    /// Returns true if every placeholder has a value.
    pub fn is_bound(&self) -> bool {
        self.where_clause.as_ref().map_or(true, Predicate::is_bound)
    }

    /// Returns a copy with every placeholder resolved from `values`.
    pub fn bind(&self, values: &[Value]) -> Result<SelectQuery> {
        let mut bound = self.clone();
        bound.where_clause = match &self.where_clause {
            Some(pred) => Some(pred.bind(values)?),
            None if values.is_empty() => None,
            None => {
                return Err(Error::syntax(format!(
                    "query has no placeholders, got {} bound values",
                    values.len()
                )))
            }
        };
        Ok(bound)
    }

    /// Returns true if the projection aggregates rows.
    pub fn has_aggregates(&self) -> bool {
        !self.group_by.is_empty() || self.columns.iter().any(Expr::is_aggregate)
    }

    /// Checks the query is well formed against its `from` tables.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(Error::syntax("select requires at least one table"));
        }
        let mut names = BTreeSet::new();
        for table in &self.from {
            if !names.insert(table.effective_name()) {
                return Err(Error::syntax(format!(
                    "table {} appears more than once; alias one of them",
                    table.effective_name()
                )));
            }
        }

        let mut referenced: Vec<&ColumnRef> = Vec::new();
        referenced.extend(self.columns.iter().filter_map(Expr::column_ref));
        referenced.extend(self.order_by.iter().map(|(c, _)| c));
        referenced.extend(self.group_by.iter());
        if let Some(pred) = &self.where_clause {
            referenced.extend(pred.columns());
        }
        for column in referenced {
            self.check_column(column)?;
        }

        if let Some(pred) = &self.where_clause {
            pred.validate()?;
        }
        self.validate_projection()
    }

    fn check_column(&self, column: &ColumnRef) -> Result<()> {
        let known = self.from.iter().any(|t| {
            t.effective_name() == column.table
                && t.columns().get(column.index).map(|c| c.name()) == Some(column.column.as_str())
        });
        if known {
            Ok(())
        } else {
            Err(Error::syntax(format!(
                "column {} does not belong to any table in from",
                column.normalized_name()
            )))
        }
    }

    fn validate_projection(&self) -> Result<()> {
        let standalone_distinct = self.columns.iter().any(|e| {
            matches!(e, Expr::Aggregate(agg) if agg.func == AggregateFunc::Distinct)
        });
        if standalone_distinct && (self.columns.len() > 1 || !self.group_by.is_empty()) {
            return Err(Error::syntax(
                "distinct cannot be combined with other columns or group by",
            ));
        }

        for expr in &self.columns {
            if let Expr::Aggregate(agg) = expr {
                match &agg.column {
                    Some(col) if agg.func.is_numeric() && !col.data_type.is_numeric() => {
                        return Err(Error::syntax(format!(
                            "{} requires a numeric column, {} is {}",
                            agg.func.name(),
                            col.normalized_name(),
                            col.data_type.name()
                        )));
                    }
                    None if agg.func != AggregateFunc::Count => {
                        return Err(Error::syntax(format!("{}(*) is not supported", agg.func.name())));
                    }
                    _ => {}
                }
            }
        }

        if !self.has_aggregates() {
            return Ok(());
        }
        for expr in &self.columns {
            if let Expr::Column(col) = expr {
                if !self.group_by.iter().any(|g| g.same_column(col)) {
                    let reason: String = if self.group_by.is_empty() {
                        "cannot mix aggregated and plain columns".into()
                    } else {
                        format!("{} is not in group by", col.normalized_name())
                    };
                    return Err(Error::syntax(reason));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::param;
    use alloc::vec;
    use quarry_core::schema::TableBuilder;
    use quarry_core::{DataType, ErrorKind};

    fn job() -> Table {
        TableBuilder::new("job")
            .unwrap()
            .add_column("id", DataType::String)
            .unwrap()
            .add_column("title", DataType::String)
            .unwrap()
            .add_column("maxSalary", DataType::Float64)
            .unwrap()
            .build()
            .unwrap()
    }

    fn col(t: &Table, name: &str) -> ColumnRef {
        ColumnRef::of(t, name).unwrap()
    }

    fn select(from: Vec<Table>) -> SelectQuery {
        SelectQuery {
            from,
            ..SelectQuery::default()
        }
    }

    #[test]
    fn test_validate_requires_from() {
        let err = SelectQuery::new().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_validate_duplicate_tables() {
        let j = job();
        assert!(select(vec![j.clone(), j.clone()]).validate().is_err());
        assert!(select(vec![j.as_alias("j1"), j.as_alias("j2")]).validate().is_ok());
    }

    #[test]
    fn test_validate_foreign_column() {
        let j = job();
        let j1 = j.as_alias("j1");
        let mut q = select(vec![j.clone()]);
        q.columns = vec![Expr::column(col(&j1, "title"))];
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validate_literal_type() {
        let j = job();
        let mut q = select(vec![j.clone()]);
        q.where_clause = Some(col(&j, "maxSalary").eq("a lot"));
        assert_eq!(q.validate().unwrap_err().kind(), ErrorKind::Data);
    }

    #[test]
    fn test_validate_aggregates() {
        let j = job();
        let mut q = select(vec![j.clone()]);
        q.columns = vec![Expr::column(col(&j, "title")), Expr::count_star()];
        assert!(q.validate().is_err());

        q.group_by = vec![col(&j, "title")];
        assert!(q.validate().is_ok());

        q.columns = vec![Expr::avg(col(&j, "title"))];
        assert!(q.validate().is_err());

        let mut q = select(vec![j.clone()]);
        q.columns = vec![Expr::distinct(col(&j, "title")), Expr::count_star()];
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_bind() {
        let j = job();
        let mut q = select(vec![j.clone()]);
        q.where_clause = Some(col(&j, "maxSalary").gt(param(0)));
        assert_eq!(q.param_count(), 1);
        assert!(!q.is_bound());

        let bound = q.bind(&[Value::Float64(1.0)]).unwrap();
        assert!(bound.is_bound());
        assert_eq!(q.bind(&[]).unwrap_err().kind(), ErrorKind::Syntax);
        assert!(select(vec![j]).bind(&[Value::Int32(1)]).is_err());
    }
}
