//! AND predicate pass - flattens nested conjunctions.
//!
//! Every select node ends up holding either a single leaf or one AND node
//! whose children are the full list of conjuncts, so later passes can move
//! each conjunct on its own.
//!
//! Example:
//! ```text
//! Select(AND(AND(a, b), c))    =>    Select(AND(a, b, c))
//!          |                                 |
//!     CrossProduct                      CrossProduct
//! ```
//!
//! Conjunctions nested under an OR are flattened the same way.

use crate::ast::{and, CombinedPredicate, LogicalOp, Predicate};
use crate::optimizer::OptimizerPass;
use crate::planner::{LogicalNode, LogicalPlan};
use alloc::vec::Vec;

/// Pass that flattens nested AND predicates.
pub struct AndPredicatePass;

impl OptimizerPass for AndPredicatePass {
    fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        for id in plan.pre_order() {
            if let LogicalNode::Select { predicate } = plan.get_mut(id) {
                let flat = flatten(core::mem::replace(predicate, and(Vec::new())));
                *predicate = flat;
            }
        }
        plan
    }

    fn name(&self) -> &'static str {
        "and_predicate"
    }
}

fn flatten(predicate: Predicate) -> Predicate {
    match predicate {
        Predicate::Combined(c) if c.op == LogicalOp::And => {
            let conjuncts: Vec<Predicate> = c
                .children
                .into_iter()
                .map(flatten)
                .flat_map(Predicate::flatten_and)
                .collect();
            and(conjuncts)
        }
        Predicate::Combined(c) => Predicate::Combined(CombinedPredicate {
            op: c.op,
            children: c.children.into_iter().map(flatten).collect(),
        }),
        leaf => leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{or, ColumnRef};
    use crate::planner::Tree;
    use alloc::vec;
    use quarry_core::DataType;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new("t", name, 0, DataType::Int64)
    }

    fn select(predicate: Predicate) -> LogicalPlan {
        let mut plan = Tree::new(LogicalNode::Select { predicate });
        let scan = plan.add(LogicalNode::CrossProduct);
        plan.add_child(plan.root(), scan);
        plan
    }

    fn root_predicate(plan: &LogicalPlan) -> &Predicate {
        match plan.get(plan.root()) {
            LogicalNode::Select { predicate } => predicate,
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_flattens_nested_and() {
        let (a, b, c) = (col("a").eq(1), col("b").eq(2), col("c").eq(3));
        let plan = select(and(vec![and(vec![a.clone(), b.clone()]), c.clone()]));
        let plan = AndPredicatePass.optimize(plan);
        assert_eq!(root_predicate(&plan), &and(vec![a, b, c]));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_flattens_under_or() {
        let (a, b, c, d) = (col("a").eq(1), col("b").eq(2), col("c").eq(3), col("d").eq(4));
        let nested = or(vec![and(vec![and(vec![a.clone(), b.clone()]), c.clone()]), d.clone()]);
        let plan = AndPredicatePass.optimize(select(nested));
        assert_eq!(root_predicate(&plan), &or(vec![and(vec![a, b, c]), d]));
    }

    #[test]
    fn test_leaf_untouched() {
        let a = col("a").gt(1);
        let plan = AndPredicatePass.optimize(select(a.clone()));
        assert_eq!(root_predicate(&plan), &a);
    }
}
