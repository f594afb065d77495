//! Table definition for Quarry schemas.

use super::column::Column;
use super::index::{IndexDef, IndexedColumn, Order};
use crate::error::{Error, Result};
use crate::types::DataType;
use crate::value::Value;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A table definition in the database schema.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    alias: Option<String>,
    columns: Vec<Column>,
    indices: Vec<IndexDef>,
    /// Position of the primary key in `indices`.
    primary_key: Option<usize>,
    persistent_index: bool,
}

impl Table {
    /// Creates a new table with the given name and columns and no indices.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        Self {
            name: name.into(),
            alias: None,
            columns,
            indices: Vec::new(),
            primary_key: None,
            persistent_index: false,
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alias, if this is an aliased copy.
    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the name queries refer to this table by: the alias if one is
    /// set, the table name otherwise.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Returns a copy of this table that is referred to as `alias`.
    ///
    /// The copy shares rows and indices with the original; only the name used
    /// in column references changes, which is what makes self-joins possible.
    pub fn as_alias(&self, alias: impl Into<String>) -> Table {
        let mut table = self.clone();
        table.alias = Some(alias.into());
        table
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the indices, primary key included.
    #[inline]
    pub fn indices(&self) -> &[IndexDef] {
        &self.indices
    }

    /// Returns whether indices should be persisted.
    #[inline]
    pub fn persistent_index(&self) -> bool {
        self.persistent_index
    }

    /// Returns the name of the row-id index (`"<table>.#"`).
    pub fn row_id_index_name(&self) -> String {
        format!("{}.#", self.name)
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Gets a column by name, failing with a not-found error.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.get_column(name)
            .ok_or_else(|| Error::column_not_found(self.effective_name(), name))
    }

    /// Gets an index by name.
    pub fn get_index(&self, name: &str) -> Option<&IndexDef> {
        self.indices.iter().find(|i| i.name() == name)
    }

    /// Returns the primary key index if defined.
    pub fn primary_key(&self) -> Option<&IndexDef> {
        self.primary_key.and_then(|i| self.indices.get(i))
    }

    /// Checks that `values` is a well-formed payload for this table.
    pub fn validate_row(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::data(format!(
                "table {} expects {} values, got {}",
                self.name,
                self.columns.len(),
                values.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(values) {
            if value.is_null() {
                if !column.is_nullable() {
                    return Err(Error::null_constraint(format!(
                        "{}.{}",
                        self.name,
                        column.name()
                    )));
                }
            } else if !value.conforms_to(column.data_type()) {
                return Err(Error::type_mismatch(column.data_type(), value.data_type()));
            }
        }
        Ok(())
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    indices: Vec<IndexDef>,
    pk_column: Option<IndexedColumn>,
    persistent_index: bool,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
            indices: Vec::new(),
            pk_column: None,
            persistent_index: false,
        })
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(Error::invalid_schema(format!("Column already exists: {}", name)));
        }
        self.columns.push(Column::new(name, data_type));
        Ok(self)
    }

    /// Marks columns as nullable.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Gives a column an output alias.
    pub fn add_alias(mut self, column: &str, alias: impl Into<String>) -> Result<Self> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name() == column)
            .ok_or_else(|| Error::invalid_schema(format!("Column not found: {}", column)))?;
        *col = col.clone().alias(alias);
        Ok(self)
    }

    /// Sets the primary key column. The key is a unique index named
    /// `pk<Table>`.
    pub fn add_primary_key(mut self, column: &str) -> Result<Self> {
        if self.pk_column.is_some() {
            return Err(Error::invalid_schema(format!(
                "Primary key already declared for {}",
                self.name
            )));
        }
        self.check_indexable(column)?;
        self.pk_column = Some(IndexedColumn::new(column));
        Ok(self)
    }

    /// Adds a unique index.
    pub fn add_unique(self, name: impl Into<String>, column: &str) -> Result<Self> {
        self.add_index(name, column, true, Order::Asc)
    }

    /// Adds an index over one column.
    pub fn add_index(
        mut self,
        name: impl Into<String>,
        column: &str,
        unique: bool,
        order: Order,
    ) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        if self.indices.iter().any(|i| i.name() == name) {
            return Err(Error::invalid_schema(format!("Index already exists: {}", name)));
        }
        self.check_indexable(column)?;

        let idx = IndexDef::new(name, &self.name, IndexedColumn::new(column).order(order))
            .unique(unique);
        self.indices.push(idx);
        Ok(self)
    }

    /// Sets whether to persist indices.
    pub fn persistent_index(mut self, value: bool) -> Self {
        self.persistent_index = value;
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        if self.columns.is_empty() {
            return Err(Error::invalid_schema(format!("Table {} has no columns", self.name)));
        }

        let mut indices = self.indices;
        let mut primary_key = None;
        if let Some(pk_column) = self.pk_column {
            let pk_name = format!("pk{}", capitalize(&self.name));
            if indices.iter().any(|i| i.name() == pk_name) {
                return Err(Error::invalid_schema(format!("Index already exists: {}", pk_name)));
            }
            primary_key = Some(indices.len());
            indices.push(IndexDef::new(pk_name, &self.name, pk_column).unique(true));
        }

        let mut table = Table::new(self.name, self.columns);
        table.indices = indices;
        table.primary_key = primary_key;
        table.persistent_index = self.persistent_index;
        Ok(table)
    }

    fn check_indexable(&self, column: &str) -> Result<()> {
        match self.columns.iter().find(|c| c.name() == column) {
            None => Err(Error::invalid_schema(format!("Column not found: {}", column))),
            Some(c) if !c.is_indexable() => Err(Error::invalid_schema(format!(
                "Column is not indexable: {}",
                column
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// Validates a name follows naming rules.
pub(crate) fn check_naming_rules(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| Error::invalid_schema("Name cannot be empty"))?;
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(Error::invalid_schema(format!(
            "Name must start with letter or underscore: {}",
            name
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_schema(format!(
            "Name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use alloc::vec;

    fn job_table() -> Table {
        TableBuilder::new("job")
            .unwrap()
            .add_column("id", DataType::String)
            .unwrap()
            .add_column("title", DataType::String)
            .unwrap()
            .add_column("minSalary", DataType::Float64)
            .unwrap()
            .add_column("maxSalary", DataType::Float64)
            .unwrap()
            .add_primary_key("id")
            .unwrap()
            .add_index("idxMaxSalary", "maxSalary", false, Order::Desc)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_builder() {
        let table = job_table();
        assert_eq!(table.name(), "job");
        assert_eq!(table.columns().len(), 4);
        assert_eq!(table.indices().len(), 2);
        assert_eq!(table.primary_key().map(|i| i.name()), Some("pkJob"));
        assert!(!table.persistent_index());
    }

    #[test]
    fn test_row_id_index_name() {
        assert_eq!(job_table().row_id_index_name(), "job.#");
    }

    #[test]
    fn test_alias() {
        let table = job_table();
        assert_eq!(table.effective_name(), "job");

        let j1 = table.as_alias("j1");
        assert_eq!(j1.name(), "job");
        assert_eq!(j1.alias(), Some("j1"));
        assert_eq!(j1.effective_name(), "j1");
        assert_eq!(j1.row_id_index_name(), "job.#");
    }

    #[test]
    fn test_table_get_column() {
        let table = job_table();
        assert!(table.get_column("title").is_some());
        assert_eq!(table.get_column_index("minSalary"), Some(2));
        assert_eq!(table.column("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validate_row() {
        let table = job_table();
        let ok = vec![
            Value::String("j1".into()),
            Value::String("Engineer".into()),
            Value::Float64(1.0),
            Value::Float64(2.0),
        ];
        assert!(table.validate_row(&ok).is_ok());

        let short = vec![Value::String("j1".into())];
        assert_eq!(table.validate_row(&short).unwrap_err().kind(), ErrorKind::Data);

        let mut wrong_type = ok.clone();
        wrong_type[2] = Value::Int64(1);
        assert_eq!(table.validate_row(&wrong_type).unwrap_err().kind(), ErrorKind::Data);

        let mut null = ok;
        null[1] = Value::Null;
        assert_eq!(table.validate_row(&null).unwrap_err().kind(), ErrorKind::Constraint);
    }

    #[test]
    fn test_invalid_column_name() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("123invalid", DataType::Int32);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_column() {
        let result = TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("id", DataType::Int64);
        assert!(result.is_err());
    }

    #[test]
    fn test_index_on_bytes_rejected() {
        let result = TableBuilder::new("blob")
            .unwrap()
            .add_column("data", DataType::Bytes)
            .unwrap()
            .add_index("idxData", "data", false, Order::Asc);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(TableBuilder::new("empty").unwrap().build().is_err());
    }
}
