//! Query planner module.

mod logical;
mod physical;
mod query_planner;
mod tree;

pub use logical::{explain, subtree_tables, LogicalNode, LogicalPlan, LogicalPlanBuilder};
pub use physical::{explain_physical, PhysicalNode, PhysicalPlan, PhysicalPlanGenerator};
pub use query_planner::QueryPlanner;
pub use tree::{NodeId, Tree};
