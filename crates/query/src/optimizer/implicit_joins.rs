//! Implicit joins pass - converts Select + CrossProduct patterns to joins.
//!
//! A select holding a column equality between two tables, sitting directly
//! above a binary cross product whose two sides read one table each, turns
//! the cross product into a join on that equality and disappears.
//!
//! Example:
//! ```text
//! Select(a.id = b.a_id)       =>       Join(a.id = b.a_id)
//!        |                              /            \
//!   CrossProduct                 TableAccess(a)  TableAccess(b)
//!    /        \
//! TableAccess(a) TableAccess(b)
//! ```

use crate::ast::{JoinPredicate, Predicate};
use crate::optimizer::OptimizerPass;
use crate::planner::NodeId;
use crate::planner::{subtree_tables, LogicalNode, LogicalPlan};
use alloc::vec::Vec;

/// Pass that converts cross products filtered by an equality into joins.
pub struct ImplicitJoinsPass;

impl OptimizerPass for ImplicitJoinsPass {
    fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        let selects: Vec<NodeId> = plan
            .pre_order()
            .into_iter()
            .filter(|id| plan.get(*id).is_select())
            .collect();

        for id in selects {
            let Some(product) = plan.children(id).first().copied() else {
                continue;
            };
            if !plan.get(product).is_cross_product() || plan.children(product).len() != 2 {
                continue;
            }
            let join = match plan.get(id) {
                LogicalNode::Select {
                    predicate: Predicate::Join(join),
                } if join.is_equi_join() => join,
                _ => continue,
            };
            let Some(predicate) = orient(&plan, product, join) else {
                continue;
            };
            *plan.get_mut(product) = LogicalNode::Join { predicate };
            plan.splice(id);
        }
        plan
    }

    fn name(&self) -> &'static str {
        "implicit_joins"
    }
}

/// Returns the join predicate with its left column on the product's left
/// side, or `None` if the two columns do not fall on different sides.
fn orient(plan: &LogicalPlan, product: NodeId, join: &JoinPredicate) -> Option<JoinPredicate> {
    let children = plan.children(product);
    let left = subtree_tables(plan, children[0]);
    let right = subtree_tables(plan, children[1]);
    let (l, r) = (join.left.table.as_str(), join.right.table.as_str());
    if left.contains(&l) && right.contains(&r) {
        Some(join.clone())
    } else if left.contains(&r) && right.contains(&l) {
        Some(join.reverse())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{and, ColumnRef};
    use crate::optimizer::Optimizer;
    use crate::planner::{explain, LogicalPlanBuilder};
    use crate::query::SelectQuery;
    use alloc::vec;
    use quarry_core::schema::{Table, TableBuilder};
    use quarry_core::DataType;

    fn table(name: &str) -> Table {
        TableBuilder::new(name)
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("x", DataType::Int64)
            .unwrap()
            .build()
            .unwrap()
    }

    fn c(t: &Table, name: &str) -> ColumnRef {
        ColumnRef::of(t, name).unwrap()
    }

    #[test]
    fn test_equality_becomes_join() {
        let (a, b) = (table("a"), table("b"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone()],
            where_clause: Some(and(vec![
                c(&b, "id").eq_col(&c(&a, "id")),
                c(&a, "x").gt(1),
            ])),
            ..SelectQuery::default()
        };
        let plan = Optimizer::new().optimize(LogicalPlanBuilder::build(&q));
        assert_eq!(
            explain(&plan),
            "project()\n\
             -join(type: inner, a.id = b.id)\n\
             --select(a.x > Int64(1))\n\
             ---table_access(a)\n\
             --table_access(b)\n"
        );
    }

    #[test]
    fn test_three_tables() {
        let (a, b, t) = (table("a"), table("b"), table("c"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone(), t.clone()],
            where_clause: Some(and(vec![
                c(&a, "id").eq_col(&c(&b, "id")),
                c(&t, "id").eq_col(&c(&b, "x")),
            ])),
            ..SelectQuery::default()
        };
        let plan = Optimizer::new().optimize(LogicalPlanBuilder::build(&q));
        assert_eq!(
            explain(&plan),
            "project()\n\
             -join(type: inner, b.x = c.id)\n\
             --join(type: inner, a.id = b.id)\n\
             ---table_access(a)\n\
             ---table_access(b)\n\
             --table_access(c)\n"
        );
    }

    #[test]
    fn test_non_equality_stays_select() {
        let (a, b) = (table("a"), table("b"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone()],
            where_clause: Some(c(&a, "id").join(crate::ast::EvalType::Lt, &c(&b, "id"))),
            ..SelectQuery::default()
        };
        let plan = Optimizer::new().optimize(LogicalPlanBuilder::build(&q));
        assert_eq!(
            explain(&plan),
            "project()\n\
             -select(a.id < b.id)\n\
             --cross_product\n\
             ---table_access(a)\n\
             ---table_access(b)\n"
        );
    }

    #[test]
    fn test_self_join_through_aliases() {
        let base = table("a");
        let (a1, a2) = (base.as_alias("a1"), base.as_alias("a2"));
        let q = SelectQuery {
            from: vec![a1.clone(), a2.clone()],
            where_clause: Some(c(&a1, "x").eq_col(&c(&a2, "id"))),
            ..SelectQuery::default()
        };
        let plan = Optimizer::new().optimize(LogicalPlanBuilder::build(&q));
        assert_eq!(
            explain(&plan),
            "project()\n\
             -join(type: inner, a1.x = a2.id)\n\
             --table_access(a as a1)\n\
             --table_access(a as a2)\n"
        );
    }
}
