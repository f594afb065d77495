//! Push-down selections pass - moves each conjunct next to its data.
//!
//! Every select node is split into one select per conjunct. Each conjunct
//! is placed directly above the lowest node whose subtree reads every table
//! the conjunct references. A conjunct over two tables therefore stays
//! above the cross product or join that combines them.
//!
//! Example:
//! ```text
//! Select(AND(a.x > 1, a.id = b.id))        Select(a.id = b.id)
//!              |                                   |
//!         CrossProduct               =>       CrossProduct
//!          /        \                          /        \
//!        A            B                 Select(a.x > 1)   B
//!                                             |
//!                                             A
//! ```

use crate::ast::Predicate;
use crate::optimizer::OptimizerPass;
use crate::planner::NodeId;
use crate::planner::{subtree_tables, LogicalNode, LogicalPlan};
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

/// Pass that pushes selections towards the table accesses.
pub struct PushDownSelectionsPass;

impl OptimizerPass for PushDownSelectionsPass {
    fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        let selects: Vec<NodeId> = plan
            .pre_order()
            .into_iter()
            .filter(|id| plan.get(*id).is_select())
            .collect();

        for id in selects {
            let [child] = plan.children(id) else {
                continue;
            };
            let child = *child;
            let conjuncts = match plan.get(id) {
                LogicalNode::Select { predicate } => predicate.clone().flatten_and(),
                _ => continue,
            };
            plan.splice(id);

            for conjunct in conjuncts {
                let target = lowest_covering(&plan, child, &conjunct.tables());
                let select = plan.add(LogicalNode::Select {
                    predicate: conjunct,
                });
                plan.insert_above(target, select);
            }
        }
        plan
    }

    fn name(&self) -> &'static str {
        "push_down_selections"
    }
}

/// Walks down from `node` while exactly one child covers `tables`.
fn lowest_covering(plan: &LogicalPlan, mut node: NodeId, tables: &BTreeSet<String>) -> NodeId {
    loop {
        let next = match plan.get(node) {
            LogicalNode::Select { .. } => plan.children(node).first().copied(),
            LogicalNode::CrossProduct | LogicalNode::Join { .. } => {
                let mut covering = plan.children(node).iter().filter(|child| {
                    let below = subtree_tables(plan, **child);
                    tables.iter().all(|t| below.contains(&t.as_str()))
                });
                match (covering.next(), covering.next()) {
                    (Some(only), None) => Some(*only),
                    _ => None,
                }
            }
            _ => None,
        };
        match next {
            Some(child) => node = child,
            None => return node,
        }
    }
}

/// Conjuncts of the select nodes directly above `node`, innermost first.
pub(crate) fn selects_above(plan: &LogicalPlan, node: NodeId) -> Vec<(NodeId, &Predicate)> {
    let mut out = Vec::new();
    let mut current = plan.parent(node);
    while let Some(id) = current {
        match plan.get(id) {
            LogicalNode::Select { predicate } => out.push((id, predicate)),
            _ => break,
        }
        current = plan.parent(id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{and, ColumnRef};
    use crate::optimizer::{AndPredicatePass, CrossProductPass};
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

    fn rewrite(query: &SelectQuery) -> LogicalPlan {
        let plan = LogicalPlanBuilder::build(query);
        let plan = AndPredicatePass.optimize(plan);
        let plan = CrossProductPass.optimize(plan);
        PushDownSelectionsPass.optimize(plan)
    }

    #[test]
    fn test_single_table_conjuncts_reach_leaf() {
        let (a, b) = (table("a"), table("b"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone()],
            where_clause: Some(and(vec![
                c(&a, "x").gt(1),
                c(&a, "id").eq_col(&c(&b, "id")),
                c(&b, "x").lt(5),
            ])),
            ..SelectQuery::default()
        };
        assert_eq!(
            explain(&rewrite(&q)),
            "project()\n\
             -select(a.id = b.id)\n\
             --cross_product\n\
             ---select(a.x > Int64(1))\n\
             ----table_access(a)\n\
             ---select(b.x < Int64(5))\n\
             ----table_access(b)\n"
        );
    }

    #[test]
    fn test_join_condition_stops_at_combining_product() {
        let (a, b, t) = (table("a"), table("b"), table("c"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone(), t.clone()],
            where_clause: Some(and(vec![
                c(&a, "id").eq_col(&c(&b, "id")),
                c(&b, "id").eq_col(&c(&t, "id")),
            ])),
            limit: Some(3),
            ..SelectQuery::default()
        };
        assert_eq!(
            explain(&rewrite(&q)),
            "project()\n\
             -limit(3)\n\
             --select(b.id = c.id)\n\
             ---cross_product\n\
             ----select(a.id = b.id)\n\
             -----cross_product\n\
             ------table_access(a)\n\
             ------table_access(b)\n\
             ----table_access(c)\n"
        );
    }

    #[test]
    fn test_or_over_two_tables_stays_above() {
        let (a, b) = (table("a"), table("b"));
        let q = SelectQuery {
            from: vec![a.clone(), b.clone()],
            where_clause: Some(crate::ast::or(vec![c(&a, "x").eq(1), c(&b, "x").eq(2)])),
            ..SelectQuery::default()
        };
        let plan = rewrite(&q);
        let root_child = plan.children(plan.root())[0];
        assert!(plan.get(root_child).is_select());
    }

    #[test]
    fn test_selects_above() {
        let a = table("a");
        let q = SelectQuery {
            from: vec![a.clone()],
            where_clause: Some(and(vec![c(&a, "x").gt(1), c(&a, "id").eq(2)])),
            ..SelectQuery::default()
        };
        let plan = rewrite(&q);
        let leaf = plan.leaves(plan.root())[0];
        let above = selects_above(&plan, leaf);
        assert_eq!(above.len(), 2);
        assert_eq!(above[0].1, &c(&a, "id").eq(2));
    }
}
