//! Quarry Core - core types and schema definitions.
//!
//! This crate provides the foundational types shared by every Quarry crate:
//!
//! - `DataType`: supported column types
//! - `Value`: runtime values stored in rows
//! - `Row`: an identifier plus a payload, and the `RowIdAllocator` handing out ids
//! - `schema`: columns, indices, tables and the database schema
//! - `Error`: error type carrying an `ErrorKind`
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{DataType, Value, Row};
//! use quarry_core::schema::TableBuilder;
//!
//! let table = TableBuilder::new("users")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .add_primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let row = Row::new(1, vec![Value::Int64(1), Value::String("Alice".into())]);
//! assert!(table.validate_row(row.values()).is_ok());
//! assert_eq!(table.row_id_index_name(), "users.#");
//! ```

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use row::{PersistedRow, Row, RowId, RowIdAllocator, FIRST_ROW_ID, RESERVED_ROW_ID};
pub use types::DataType;
pub use value::Value;
