//! Optimizer pass trait.

use crate::planner::LogicalPlan;

/// A rewrite pass that transforms a logical plan without changing its
/// result set.
pub trait OptimizerPass {
    /// Optimizes the given logical plan.
    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan;

    /// Returns the name of this pass.
    fn name(&self) -> &'static str {
        "unnamed"
    }
}
