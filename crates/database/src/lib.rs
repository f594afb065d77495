//! Quarry Database - the embedded database facade.
//!
//! This crate ties the engine crates to persistent storage:
//!
//! - `Database`: opens a schema over a backstore and hands out query builders
//! - `Transaction`: explicit read-only or read-write transactions
//! - `Backstore`: the persistent storage contract, with `MemoryBackstore`
//! - `DatabaseOptions`: configuration fixed at open time
//!
//! # Example
//!
//! ```rust
//! use futures::executor::block_on;
//! use quarry_core::schema::{DatabaseSchema, TableBuilder};
//! use quarry_core::{DataType, Value};
//! use quarry_database::{Database, DatabaseOptions, MemoryBackstore};
//! use quarry_query::ast::{ColumnRef, Expr};
//! use std::rc::Rc;
//!
//! let job = TableBuilder::new("job")
//!     .unwrap()
//!     .add_column("id", DataType::String)
//!     .unwrap()
//!     .add_column("maxSalary", DataType::Float64)
//!     .unwrap()
//!     .add_primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let schema = DatabaseSchema::new("hr", 1).unwrap().add_table(job.clone()).unwrap();
//!
//! block_on(async {
//!     let db = Database::open(schema, Rc::new(MemoryBackstore::new()), DatabaseOptions::default())
//!         .await
//!         .unwrap();
//!     db.insert(&job)
//!         .values(vec![
//!             vec![Value::String("dev".into()), Value::Float64(9000.0)],
//!             vec![Value::String("ops".into()), Value::Float64(6000.0)],
//!         ])
//!         .exec()
//!         .await
//!         .unwrap();
//!
//!     let salary = ColumnRef::of(&job, "maxSalary").unwrap();
//!     let rows = db
//!         .select(vec![Expr::count_star()])
//!         .from(&[&job])
//!         .where_(salary.gt(7000.0))
//!         .exec()
//!         .await
//!         .unwrap();
//!     assert_eq!(rows[0].get("count(*)"), Some(&Value::Int64(1)));
//! });
//! ```

pub mod backstore;
mod context;
mod database;
mod options;
mod query_builder;
mod transaction;

pub use backstore::{Backstore, BackstoreTx, MemoryBackstore};
pub use context::Context;
pub use database::Database;
pub use options::DatabaseOptions;
pub use query_builder::{
    DeleteBuilder, DeleteQuery, InsertBuilder, InsertQuery, Query, SelectBuilder, UpdateBuilder,
    UpdateQuery,
};
pub use quarry_storage::{TransactionState, TransactionType};
pub use transaction::{Completion, Transaction};
