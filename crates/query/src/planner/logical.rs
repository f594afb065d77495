//! Logical query plan definitions.

use crate::ast::{ColumnRef, Expr, JoinPredicate, Predicate};
use crate::planner::{NodeId, Tree};
use crate::query::SelectQuery;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use quarry_core::schema::{Order, Table};

/// Logical query plan node.
#[derive(Clone, Debug)]
pub enum LogicalNode {
    /// Reads every row of a table.
    TableAccess { table: Table },
    /// Cartesian product of the children.
    CrossProduct,
    /// Inner join of two children on a column condition.
    Join { predicate: JoinPredicate },
    /// Keeps rows matching the predicate.
    Select { predicate: Predicate },
    /// Projection, grouped when `group_by` is set.
    Project {
        columns: Vec<Expr>,
        group_by: Vec<ColumnRef>,
    },
    OrderBy { order_by: Vec<(ColumnRef, Order)> },
    Skip { count: usize },
    Limit { count: usize },
}

/// Logical query plan.
pub type LogicalPlan = Tree<LogicalNode>;

impl LogicalNode {
    pub fn is_table_access(&self) -> bool {
        matches!(self, LogicalNode::TableAccess { .. })
    }

    pub fn is_cross_product(&self) -> bool {
        matches!(self, LogicalNode::CrossProduct)
    }

    pub fn is_select(&self) -> bool {
        matches!(self, LogicalNode::Select { .. })
    }
}

/// Effective names of the tables read below `id`.
pub fn subtree_tables(plan: &LogicalPlan, id: NodeId) -> Vec<&str> {
    plan.leaves(id)
        .into_iter()
        .filter_map(|leaf| match plan.get(leaf) {
            LogicalNode::TableAccess { table } => Some(table.effective_name()),
            _ => None,
        })
        .collect()
}

/// Builds the naive plan for a query: a single select over the cross
/// product of every table, topped by order-by, skip, limit and project.
pub struct LogicalPlanBuilder;

impl LogicalPlanBuilder {
    pub fn build(query: &SelectQuery) -> LogicalPlan {
        let mut plan = Tree::new(LogicalNode::Project {
            columns: query.columns.clone(),
            group_by: query.group_by.clone(),
        });

        let leaves: Vec<NodeId> = query
            .from
            .iter()
            .map(|table| {
                plan.add(LogicalNode::TableAccess {
                    table: table.clone(),
                })
            })
            .collect();

        // Precedence order: every present node is the parent of the next
        // present one.
        let chain = [
            Some(plan.root()),
            query
                .limit
                .map(|count| plan.add(LogicalNode::Limit { count })),
            query
                .skip
                .map(|count| plan.add(LogicalNode::Skip { count })),
            (!query.order_by.is_empty()).then(|| {
                plan.add(LogicalNode::OrderBy {
                    order_by: query.order_by.clone(),
                })
            }),
            query.where_clause.as_ref().map(|pred| {
                plan.add(LogicalNode::Select {
                    predicate: pred.clone(),
                })
            }),
            (leaves.len() > 1).then(|| plan.add(LogicalNode::CrossProduct)),
        ];

        let mut parent = plan.root();
        for node in chain.into_iter().flatten().skip(1) {
            plan.add_child(parent, node);
            parent = node;
        }
        for leaf in leaves {
            plan.add_child(parent, leaf);
        }
        plan
    }
}

impl fmt::Display for LogicalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalNode::TableAccess { table } => match table.alias() {
                Some(alias) => write!(f, "table_access({} as {})", table.name(), alias),
                None => write!(f, "table_access({})", table.name()),
            },
            LogicalNode::CrossProduct => f.write_str("cross_product"),
            LogicalNode::Join { predicate } => write!(
                f,
                "join(type: inner, {})",
                Predicate::Join(predicate.clone())
            ),
            LogicalNode::Select { predicate } => write!(f, "select({})", predicate),
            LogicalNode::Project { columns, group_by } => {
                write!(f, "project({})", join_names(columns.iter().map(|c| c.output_name(true))))?;
                if !group_by.is_empty() {
                    write!(
                        f,
                        ", groupBy({})",
                        join_names(group_by.iter().map(ColumnRef::normalized_name))
                    )?;
                }
                Ok(())
            }
            LogicalNode::OrderBy { order_by } => write!(
                f,
                "order_by({})",
                join_names(order_by.iter().map(|(c, o)| {
                    format!(
                        "{} {}",
                        c.normalized_name(),
                        if *o == Order::Asc { "ASC" } else { "DESC" }
                    )
                }))
            ),
            LogicalNode::Skip { count } => write!(f, "skip({})", count),
            LogicalNode::Limit { count } => write!(f, "limit({})", count),
        }
    }
}

pub(crate) fn join_names(names: impl Iterator<Item = String>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Renders a logical plan as indented text.
pub fn explain(plan: &LogicalPlan) -> String {
    plan.render(|node| format!("{}", node))
}
