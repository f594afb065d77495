//! Schema module for Quarry.
//!
//! Columns, indices, tables and the database-level schema that groups them.

mod column;
mod database;
mod index;
mod table;

pub use column::Column;
pub use database::DatabaseSchema;
pub use index::{IndexDef, IndexedColumn, Order};
pub use table::{Table, TableBuilder};
