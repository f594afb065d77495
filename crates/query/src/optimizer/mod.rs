//! Query optimizer module.
//!
//! The optimizer rewrites the naive logical plan with a fixed sequence of
//! passes, each applied once:
//!
//! 1. [`AndPredicatePass`] flattens nested conjunctions
//! 2. [`CrossProductPass`] makes every cross product binary
//! 3. [`PushDownSelectionsPass`] moves each conjunct next to its tables
//! 4. [`ImplicitJoinsPass`] turns equality-filtered cross products into joins

mod and_predicate;
mod cross_product;
mod implicit_joins;
mod pass;
mod push_down_selections;

pub use and_predicate::AndPredicatePass;
pub use cross_product::CrossProductPass;
pub use implicit_joins::ImplicitJoinsPass;
pub use pass::OptimizerPass;
pub use push_down_selections::PushDownSelectionsPass;

pub(crate) use push_down_selections::selects_above;

use crate::planner::LogicalPlan;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Query optimizer that applies optimization passes in order.
pub struct Optimizer {
    passes: Vec<Box<dyn OptimizerPass>>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Creates an optimizer with the default passes.
    pub fn new() -> Self {
        Self {
            passes: alloc::vec![
                Box::new(AndPredicatePass),
                Box::new(CrossProductPass),
                Box::new(PushDownSelectionsPass),
                Box::new(ImplicitJoinsPass),
            ],
        }
    }

    /// Creates an optimizer with custom passes.
    pub fn with_passes(passes: Vec<Box<dyn OptimizerPass>>) -> Self {
        Self { passes }
    }

    /// Optimizes a logical plan.
    pub fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        for pass in &self.passes {
            plan = pass.optimize(plan);
            tracing::trace!(pass = pass.name(), "applied optimizer pass");
        }
        plan
    }

    /// Names of the passes, in application order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_default_pass_order() {
        assert_eq!(
            Optimizer::new().pass_names(),
            vec![
                "and_predicate",
                "cross_product",
                "push_down_selections",
                "implicit_joins"
            ]
        );
    }

    #[test]
    fn test_no_passes_is_identity() {
        use crate::planner::Tree;
        use crate::planner::LogicalNode;

        let plan: LogicalPlan = Tree::new(LogicalNode::Limit { count: 1 });
        let out = Optimizer::with_passes(Vec::new()).optimize(plan);
        assert_eq!(out.len(), 1);
    }
}
