//! Quarry Storage - committed rows and per-transaction staging.
//!
//! This crate provides the storage layer including:
//!
//! - `RowStore`: rows of one table with index maintenance
//! - `TableCache`: committed stores for every table
//! - `Journal`: staged changes of one transaction, and `JournalView` to read them
//! - `Transaction`: transaction state machine
//! - `LockManager`: per-table write locks
//!
//! # Example
//!
//! ```rust
//! use quarry_storage::{TableCache, Transaction, TransactionType};
//! use quarry_core::schema::TableBuilder;
//! use quarry_core::{DataType, Row, Value};
//!
//! let mut cache = TableCache::new();
//! let schema = TableBuilder::new("users")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .add_primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! cache.create_table(schema).unwrap();
//!
//! let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
//! let row = Row::new(1, vec![Value::Int64(1), Value::String("Alice".into())]);
//! tx.insert(&cache, "users", row).unwrap();
//! assert_eq!(cache.get_table("users").unwrap().len(), 0);
//!
//! tx.commit().unwrap().install(&mut cache);
//! assert_eq!(cache.get_table("users").unwrap().len(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod cache;
pub mod journal;
pub mod lock;
pub mod row_store;
pub mod transaction;

pub use cache::TableCache;
pub use journal::{Journal, JournalView, TableDiff};
pub use lock::LockManager;
pub use row_store::RowStore;
pub use transaction::{Transaction, TransactionId, TransactionState, TransactionType};
