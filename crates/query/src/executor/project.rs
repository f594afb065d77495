//! Project executor.

use crate::ast::Expr;
use crate::executor::Relation;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use quarry_core::Value;

/// One output row of a select: values keyed by output field name.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    columns: Rc<[String]>,
    values: Vec<Value>,
}

impl ResultRow {
    pub fn new(columns: Rc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Returns the value of field `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let pos = self.columns.iter().position(|c| c == name)?;
        self.values.get(pos)
    }

    /// Field names, in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Project executor - turns relation entries into result rows.
///
/// Column expressions read from the entry's rows. The k-th aggregate
/// expression reads the k-th aggregate value of the entry.
pub struct ProjectExecutor<'a> {
    columns: &'a [Expr],
    qualify: bool,
}

impl<'a> ProjectExecutor<'a> {
    /// `qualify` prefixes unaliased column names with their table.
    pub fn new(columns: &'a [Expr], qualify: bool) -> Self {
        Self { columns, qualify }
    }

    pub fn execute(&self, input: Relation) -> Vec<ResultRow> {
        let names: Rc<[String]> = self
            .columns
            .iter()
            .map(|expr| expr.output_name(self.qualify))
            .collect::<Vec<_>>()
            .into();

        input
            .entries
            .iter()
            .map(|entry| {
                let view = input.view(entry);
                let mut aggregates = entry.aggregates.iter();
                let values = self
                    .columns
                    .iter()
                    .map(|expr| match expr {
                        Expr::Column(col) => view.get(col).cloned(),
                        Expr::Aggregate(_) => aggregates.next().cloned(),
                    })
                    .map(|v| v.unwrap_or(Value::Null))
                    .collect();
                ResultRow::new(names.clone(), values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnRef;
    use crate::executor::RelationEntry;
    use alloc::vec;
    use quarry_core::{DataType, Row};

    fn users() -> Relation {
        let rows = vec![
            Rc::new(Row::new(1, vec![Value::Int64(1), Value::String("Alice".into())])),
            Rc::new(Row::new(2, vec![Value::Int64(2), Value::String("Bob".into())])),
        ];
        Relation::from_rows(rows, "users")
    }

    #[test]
    fn test_project_columns() {
        let columns = vec![
            Expr::column(ColumnRef::new("users", "name", 1, DataType::String)),
            Expr::column(ColumnRef::new("users", "id", 0, DataType::Int64).alias("userId")),
        ];
        let rows = ProjectExecutor::new(&columns, false).execute(users());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns(), ["name", "userId"]);
        assert_eq!(rows[1].get("name"), Some(&Value::String("Bob".into())));
        assert_eq!(rows[1].get("userId"), Some(&Value::Int64(2)));
        assert_eq!(rows[1].get("id"), None);
    }

    #[test]
    fn test_qualified_names() {
        let columns = vec![Expr::column(ColumnRef::new("users", "id", 0, DataType::Int64))];
        let rows = ProjectExecutor::new(&columns, true).execute(users());
        assert_eq!(rows[0].get("users.id"), Some(&Value::Int64(1)));
    }

    #[test]
    fn test_aggregates_by_position() {
        let id = ColumnRef::new("users", "id", 0, DataType::Int64);
        let columns = vec![Expr::count_star(), Expr::max(id)];
        let mut entry = RelationEntry::default();
        entry.aggregates = vec![Value::Int64(2), Value::Int64(7)];
        let input = Relation::new(vec![entry], Rc::from(vec![String::from("users")]));

        let rows = ProjectExecutor::new(&columns, false).execute(input);
        assert_eq!(rows[0].values(), [Value::Int64(2), Value::Int64(7)]);
        assert_eq!(rows[0].get("max(id)"), Some(&Value::Int64(7)));
    }
}
