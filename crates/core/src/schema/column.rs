//! Column definition for Quarry schemas.

use crate::types::DataType;
use crate::value::Value;
use alloc::string::String;

/// A column definition in a table schema.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
    /// Output name used by projections instead of `name`.
    alias: Option<String>,
    /// Column index in the table (0-based).
    index: usize,
}

impl Column {
    /// Creates a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: data_type.is_nullable_by_default(),
            alias: None,
            index: 0,
        }
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the output alias of this column.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alias, if one was set.
    #[inline]
    pub fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the alias if present, the column name otherwise.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the column index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns whether this column can be used as an index key.
    #[inline]
    pub fn is_indexable(&self) -> bool {
        self.data_type.is_indexable()
    }

    /// Returns true if `value` can be stored in this column.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            self.nullable
        } else {
            value.conforms_to(self.data_type)
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("id", DataType::Int64);
        assert_eq!(col.name(), "id");
        assert_eq!(col.data_type(), DataType::Int64);
        assert!(!col.is_nullable());
        assert_eq!(col.get_alias(), None);
    }

    #[test]
    fn test_column_alias() {
        let col = Column::new("title", DataType::String).alias("jobTitle");
        assert_eq!(col.get_alias(), Some("jobTitle"));
        assert_eq!(col.output_name(), "jobTitle");
        assert_eq!(Column::new("title", DataType::String).output_name(), "title");
    }

    #[test]
    fn test_column_accepts() {
        let col = Column::new("salary", DataType::Float64);
        assert!(col.accepts(&Value::Float64(1.0)));
        assert!(!col.accepts(&Value::Int64(1)));
        assert!(!col.accepts(&Value::Null));
        assert!(col.clone().nullable(true).accepts(&Value::Null));
    }

    #[test]
    fn test_column_indexable() {
        assert!(Column::new("id", DataType::Int64).is_indexable());
        assert!(Column::new("name", DataType::String).is_indexable());
        assert!(!Column::new("data", DataType::Bytes).is_indexable());
        assert!(Column::new("data", DataType::Bytes).is_nullable());
    }
}
