//! Database-level schema: a named, versioned set of tables.

use super::table::{check_naming_rules, Table};
use crate::error::{Error, Result};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A named, versioned collection of table definitions.
#[derive(Clone, Debug)]
pub struct DatabaseSchema {
    name: String,
    version: u32,
    tables: Vec<Table>,
}

impl DatabaseSchema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>, version: u32) -> Result<Self> {
        let name = name.into();
        check_naming_rules(&name)?;
        Ok(Self {
            name,
            version,
            tables: Vec::new(),
        })
    }

    /// Adds a table, rejecting duplicate names.
    pub fn add_table(mut self, table: Table) -> Result<Self> {
        if self.tables.iter().any(|t| t.name() == table.name()) {
            return Err(Error::invalid_schema(format!(
                "Table already exists: {}",
                table.name()
            )));
        }
        self.tables.push(table);
        Ok(self)
    }

    /// Returns the schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns all tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::table_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::TableBuilder;
    use crate::types::DataType;

    fn table(name: &str) -> Table {
        TableBuilder::new(name)
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_tables() {
        let schema = DatabaseSchema::new("hr", 1)
            .unwrap()
            .add_table(table("job"))
            .unwrap()
            .add_table(table("employee"))
            .unwrap();

        assert_eq!(schema.name(), "hr");
        assert_eq!(schema.version(), 1);
        assert_eq!(schema.tables().len(), 2);
        assert_eq!(schema.table("employee").unwrap().name(), "employee");
        assert_eq!(schema.table("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_duplicate_table() {
        let result = DatabaseSchema::new("hr", 1)
            .unwrap()
            .add_table(table("job"))
            .unwrap()
            .add_table(table("job"));
        assert!(result.is_err());
    }
}
