//! Quarry Index - index implementations.
//!
//! Every index satisfies the object-safe [`Index`] trait, so the planner can
//! rank access paths through `cost()` and the executor can read through
//! `get_range()` without knowing the variant:
//!
//! - [`RowIdIndex`]: membership set over row ids; always reports its full
//!   cardinality as cost
//! - [`OrderedIndex`]: ordered map from column values to row ids
//!
//! # Example
//!
//! ```rust
//! use quarry_core::schema::Order;
//! use quarry_core::{DataType, Value};
//! use quarry_index::{Index, KeyRange, OrderedIndex};
//!
//! let mut index = OrderedIndex::new("job.idxSalary", DataType::Int64, false, Order::Asc);
//! index.add(Value::Int64(10), 100).unwrap();
//! index.add(Value::Int64(20), 200).unwrap();
//! index.add(Value::Int64(5), 50).unwrap();
//!
//! assert_eq!(index.get(&Value::Int64(10)), vec![100]);
//!
//! let range = KeyRange::lower_bound(Value::Int64(10), false);
//! let ids = index.get_range(Some(&range), Order::Asc, None, 0).unwrap();
//! assert_eq!(ids, vec![100, 200]);
//! ```

#![no_std]

extern crate alloc;

pub mod comparator;
mod ordered;
mod range;
mod row_id;
pub mod stats;
mod traits;

pub use comparator::{Comparator, MultiKeyComparator};
pub use ordered::OrderedIndex;
pub use quarry_core::schema::Order;
pub use range::KeyRange;
pub use row_id::RowIdIndex;
pub use stats::IndexStats;
pub use traits::{DeserializeIndex, Index, IndexKind};
