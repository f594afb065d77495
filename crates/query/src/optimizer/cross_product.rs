//! Cross product pass - normalizes cross products to binary nodes.
//!
//! A cross product over n tables becomes a left-deep chain of binary
//! cross products, so each join condition can later be matched against
//! exactly two sides. A cross product left with a single child is removed.
//!
//! Example:
//! ```text
//! CrossProduct(A, B, C)    =>        CrossProduct
//!                                     /        \
//!                               CrossProduct    C
//!                                /      \
//!                               A        B
//! ```

use crate::optimizer::OptimizerPass;
use crate::planner::{LogicalNode, LogicalPlan};
use alloc::vec::Vec;

/// Pass that converts multi-way cross products to binary ones.
pub struct CrossProductPass;

impl OptimizerPass for CrossProductPass {
    fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        let products: Vec<_> = plan
            .pre_order()
            .into_iter()
            .filter(|id| plan.get(*id).is_cross_product())
            .collect();

        for id in products {
            let children = plan.children(id).to_vec();
            match children.len() {
                0 | 2 => {}
                1 => {
                    plan.splice(id);
                }
                _ => {
                    for child in &children {
                        plan.detach(*child);
                    }
                    let mut left = children[0];
                    for right in &children[1..children.len() - 1] {
                        let product = plan.add(LogicalNode::CrossProduct);
                        plan.add_child(product, left);
                        plan.add_child(product, *right);
                        left = product;
                    }
                    plan.add_child(id, left);
                    plan.add_child(id, children[children.len() - 1]);
                }
            }
        }
        plan
    }

    fn name(&self) -> &'static str {
        "cross_product"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::explain;
    use crate::planner::Tree;
    use quarry_core::schema::TableBuilder;
    use quarry_core::DataType;

    fn with_tables(names: &[&str]) -> LogicalPlan {
        let mut plan = Tree::new(LogicalNode::CrossProduct);
        for name in names {
            let table = TableBuilder::new(*name)
                .unwrap()
                .add_column("id", DataType::Int64)
                .unwrap()
                .build()
                .unwrap();
            let leaf = plan.add(LogicalNode::TableAccess { table });
            plan.add_child(plan.root(), leaf);
        }
        plan
    }

    #[test]
    fn test_three_way_becomes_left_deep() {
        let plan = CrossProductPass.optimize(with_tables(&["a", "b", "c"]));
        assert_eq!(
            explain(&plan),
            "cross_product\n\
             -cross_product\n\
             --table_access(a)\n\
             --table_access(b)\n\
             -table_access(c)\n"
        );
    }

    #[test]
    fn test_four_way() {
        let plan = CrossProductPass.optimize(with_tables(&["a", "b", "c", "d"]));
        assert_eq!(plan.len(), 7);
        let root = plan.root();
        assert_eq!(plan.children(root).len(), 2);
        assert!(plan.get(plan.children(root)[0]).is_cross_product());
    }

    #[test]
    fn test_binary_and_single_child() {
        let plan = CrossProductPass.optimize(with_tables(&["a", "b"]));
        assert_eq!(plan.len(), 3);

        let plan = CrossProductPass.optimize(with_tables(&["a"]));
        assert_eq!(explain(&plan), "table_access(a)\n");
    }
}
