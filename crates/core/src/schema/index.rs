//! Index definition for Quarry schemas.

use alloc::format;
use alloc::string::String;
use core::cmp::Ordering;

/// Sort order for index columns and order-by keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// The column an index is keyed on.
#[derive(Clone, Debug)]
pub struct IndexedColumn {
    /// Column name.
    pub name: String,
    /// Declared key order.
    pub order: Order,
}

impl IndexedColumn {
    /// Creates a new indexed column with ascending order.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Asc,
        }
    }

    /// Sets the sort order.
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

/// An index definition in a table schema.
#[derive(Clone, Debug)]
pub struct IndexDef {
    name: String,
    table_name: String,
    column: IndexedColumn,
    unique: bool,
}

impl IndexDef {
    /// Creates a new index definition.
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        column: IndexedColumn,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            column,
            unique: false,
        }
    }

    /// Sets whether this index is unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Returns the index name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table name.
    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the normalized name (`table.index`).
    pub fn normalized_name(&self) -> String {
        format!("{}.{}", self.table_name, self.name)
    }

    /// Returns the indexed column.
    #[inline]
    pub fn column(&self) -> &IndexedColumn {
        &self.column
    }

    /// Returns whether this index is unique.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

impl PartialEq for IndexDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.table_name == other.table_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_apply() {
        assert_eq!(Order::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Order::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn test_index_def() {
        let idx = IndexDef::new("idxSalary", "job", IndexedColumn::new("maxSalary").order(Order::Desc))
            .unique(false);

        assert_eq!(idx.name(), "idxSalary");
        assert_eq!(idx.table_name(), "job");
        assert_eq!(idx.normalized_name(), "job.idxSalary");
        assert!(!idx.is_unique());
        assert_eq!(idx.column().order, Order::Desc);
    }
}
