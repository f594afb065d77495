//! Column references and projection expressions.

use alloc::format;
use alloc::string::String;
use quarry_core::schema::Table;
use quarry_core::{DataType, Result};

/// Reference to a column of a table in a query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Effective table name (the alias when the table is aliased).
    pub table: String,
    /// Column name.
    pub column: String,
    /// Column index in the table schema.
    pub index: usize,
    /// Declared column type.
    pub data_type: DataType,
    /// Output name override.
    pub alias: Option<String>,
}

impl ColumnRef {
    /// Creates a new column reference.
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        index: usize,
        data_type: DataType,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            index,
            data_type,
            alias: None,
        }
    }

    /// Resolves `column` against `table`, picking up the schema alias if any.
    pub fn of(table: &Table, column: &str) -> Result<Self> {
        let index = table
            .get_column_index(column)
            .ok_or_else(|| quarry_core::Error::column_not_found(table.effective_name(), column))?;
        let col = &table.columns()[index];
        Ok(Self {
            table: table.effective_name().into(),
            column: col.name().into(),
            index,
            data_type: col.data_type(),
            alias: col.get_alias().map(Into::into),
        })
    }

    /// Returns a copy with an output alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the normalized name (table.column).
    pub fn normalized_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }

    /// Returns the output field name. Unaliased columns are qualified by
    /// their table when the result spans several tables.
    pub fn output_name(&self, qualify: bool) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None if qualify => self.normalized_name(),
            None => self.column.clone(),
        }
    }

    /// Returns true if both refer to the same column of the same table.
    pub fn same_column(&self, other: &ColumnRef) -> bool {
        self.table == other.table && self.index == other.index
    }
}

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// One output row per distinct value when used on its own.
    Distinct,
    StdDev,
}

impl AggregateFunc {
    /// Lower-case function name used in output field names.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::Distinct => "distinct",
            AggregateFunc::StdDev => "stddev",
        }
    }

    /// Returns true if the function needs a numeric argument.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AggregateFunc::Sum | AggregateFunc::Avg | AggregateFunc::StdDev
        )
    }
}

/// An aggregated column such as `count(*)` or `avg(distinct(salary))`.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateExpr {
    pub func: AggregateFunc,
    /// `None` only for `count(*)`.
    pub column: Option<ColumnRef>,
    /// Aggregate over distinct values of the column.
    pub distinct: bool,
    pub alias: Option<String>,
}

impl AggregateExpr {
    /// Returns the output field name, e.g. `count(distinct(maxSalary))`.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        let inner = match &self.column {
            None => String::from("*"),
            Some(col) if self.distinct => format!("distinct({})", col.column),
            Some(col) => col.column.clone(),
        };
        format!("{}({})", self.func.name(), inner)
    }
}

/// A projection item.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A plain column.
    Column(ColumnRef),
    /// An aggregated column.
    Aggregate(AggregateExpr),
}

impl Expr {
    /// A plain column.
    pub fn column(column: ColumnRef) -> Self {
        Expr::Column(column)
    }

    fn aggregate(func: AggregateFunc, column: Option<ColumnRef>) -> Self {
        Expr::Aggregate(AggregateExpr {
            func,
            column,
            distinct: false,
            alias: None,
        })
    }

    pub fn count(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Count, Some(column))
    }

    /// `count(*)`: counts rows, nulls included.
    pub fn count_star() -> Self {
        Self::aggregate(AggregateFunc::Count, None)
    }

    pub fn sum(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Sum, Some(column))
    }

    pub fn avg(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Avg, Some(column))
    }

    pub fn min(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Min, Some(column))
    }

    pub fn max(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Max, Some(column))
    }

    pub fn distinct(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::Distinct, Some(column))
    }

    pub fn stddev(column: ColumnRef) -> Self {
        Self::aggregate(AggregateFunc::StdDev, Some(column))
    }

    /// Makes an aggregate consider each distinct value once, as in
    /// `count(distinct(x))`. No effect on plain columns.
    pub fn over_distinct(mut self) -> Self {
        if let Expr::Aggregate(agg) = &mut self {
            agg.distinct = true;
        }
        self
    }

    /// Sets the output field name.
    pub fn alias(self, alias: impl Into<String>) -> Self {
        match self {
            Expr::Column(col) => Expr::Column(col.alias(alias)),
            Expr::Aggregate(mut agg) => {
                agg.alias = Some(alias.into());
                Expr::Aggregate(agg)
            }
        }
    }

    /// Returns the referenced column, if any.
    pub fn column_ref(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(col) => Some(col),
            Expr::Aggregate(agg) => agg.column.as_ref(),
        }
    }

    /// Returns true if this is an aggregate.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate(_))
    }

    /// Returns the output field name.
    pub fn output_name(&self, qualify: bool) -> String {
        match self {
            Expr::Column(col) => col.output_name(qualify),
            Expr::Aggregate(agg) => agg.output_name(),
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Expr::Column(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::schema::TableBuilder;

    fn job() -> Table {
        TableBuilder::new("job")
            .unwrap()
            .add_column("id", DataType::String)
            .unwrap()
            .add_column("maxSalary", DataType::Float64)
            .unwrap()
            .add_alias("maxSalary", "top")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_column_ref_of() {
        let table = job();
        let id = ColumnRef::of(&table, "id").unwrap();
        assert_eq!(id.index, 0);
        assert_eq!(id.data_type, DataType::String);
        assert_eq!(id.output_name(false), "id");
        assert_eq!(id.output_name(true), "job.id");

        let salary = ColumnRef::of(&table, "maxSalary").unwrap();
        assert_eq!(salary.output_name(true), "top");
        assert!(ColumnRef::of(&table, "nope").is_err());
    }

    #[test]
    fn test_aliased_table_reference() {
        let j1 = job().as_alias("j1");
        let id = ColumnRef::of(&j1, "id").unwrap();
        assert_eq!(id.table, "j1");
        assert_eq!(id.normalized_name(), "j1.id");
    }

    #[test]
    fn test_aggregate_names() {
        let salary = ColumnRef::new("job", "maxSalary", 1, DataType::Float64);
        assert_eq!(Expr::count_star().output_name(false), "count(*)");
        assert_eq!(Expr::max(salary.clone()).output_name(false), "max(maxSalary)");
        assert_eq!(
            Expr::count(salary.clone()).over_distinct().output_name(false),
            "count(distinct(maxSalary))"
        );
        assert_eq!(Expr::min(salary).alias("minS").output_name(true), "minS");
    }
}
