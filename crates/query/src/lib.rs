//! Quarry Query - query engine for the Quarry embedded database.
//!
//! This crate provides the query pipeline including:
//!
//! - `ast`: column references, projections and predicates
//! - `query`: the select query description and its validation
//! - `planner`: plan arena, logical plan builder, physical plan generator
//! - `optimizer`: logical rewrite passes
//! - `executor`: query execution operators (scan, filter, join, aggregate, sort, limit, project)
//!
//! # Example
//!
//! ```rust
//! use quarry_core::schema::TableBuilder;
//! use quarry_core::{DataType, Row, Value};
//! use quarry_query::ast::{ColumnRef, Expr};
//! use quarry_query::planner::QueryPlanner;
//! use quarry_query::query::SelectQuery;
//! use quarry_storage::TableCache;
//!
//! let job = TableBuilder::new("job")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("maxSalary", DataType::Int64)
//!     .unwrap()
//!     .add_primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let mut cache = TableCache::new();
//! cache.create_table(job.clone()).unwrap();
//! let store = cache.get_table_mut("job").unwrap();
//! for i in 0..10 {
//!     store
//!         .insert(Row::new(i, vec![Value::Int64(i as i64), Value::Int64(i as i64 * 1000)]))
//!         .unwrap();
//! }
//!
//! let salary = ColumnRef::of(&job, "maxSalary").unwrap();
//! let query = SelectQuery {
//!     from: vec![job],
//!     where_clause: Some(salary.gte(7000i64)),
//!     columns: vec![Expr::count_star()],
//!     ..SelectQuery::default()
//! };
//! let rows = QueryPlanner::new().execute(&query, &cache).unwrap();
//! assert_eq!(rows[0].get("count(*)"), Some(&Value::Int64(3)));
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod executor;
pub mod optimizer;
pub mod planner;
pub mod query;
