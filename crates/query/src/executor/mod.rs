//! Query executor module.

mod aggregate;
mod filter;
pub mod join;
mod limit;
mod project;
mod relation;
mod runner;
mod sort;

pub use aggregate::AggregateExecutor;
pub use filter::FilterExecutor;
pub use join::NestedLoopJoin;
pub use limit::LimitExecutor;
pub use project::{ProjectExecutor, ResultRow};
pub use relation::{EntryView, Relation, RelationEntry, SharedTables};
pub use runner::{DataSource, PhysicalPlanRunner};
pub use sort::SortExecutor;
