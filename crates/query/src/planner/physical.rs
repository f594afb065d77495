//! Physical query plan and its generation from an optimized logical plan.

use crate::ast::{AggregateExpr, ColumnRef, Expr, JoinPredicate, Predicate};
use crate::executor::DataSource;
use crate::optimizer::selects_above;
use crate::planner::logical::{join_names, LogicalNode, LogicalPlan};
use crate::planner::{NodeId, Tree};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use quarry_core::schema::{Order, Table};
use quarry_core::{Error, Result, Value};
use quarry_index::{Index, KeyRange};

/// Physical query plan node.
#[derive(Clone, Debug)]
pub enum PhysicalNode {
    /// Reads every row of a table.
    TableScan { table: Table },
    /// Reads the rows of `ranges` through an ordered index.
    IndexRangeScan {
        table: Table,
        /// Normalized index name.
        index: String,
        ranges: Vec<KeyRange<Value>>,
    },
    Select { predicate: Predicate },
    CrossProduct,
    NestedLoopJoin { predicate: JoinPredicate },
    /// Groups the input and computes `aggregates`, in projection order.
    Aggregate {
        group_by: Vec<ColumnRef>,
        aggregates: Vec<AggregateExpr>,
    },
    OrderBy { order_by: Vec<(ColumnRef, Order)> },
    Skip { count: usize },
    Limit { count: usize },
    /// Turns entries into result rows; always the root.
    Project { columns: Vec<Expr>, qualify: bool },
}

/// Physical query plan.
pub type PhysicalPlan = Tree<PhysicalNode>;

/// Chosen index access for one table.
#[derive(Debug)]
struct AccessPath {
    index: String,
    ranges: Vec<KeyRange<Value>>,
    /// Select node answered by the index scan.
    select: NodeId,
}

/// Converts an optimized logical plan into a physical plan, choosing an
/// access path for every table from the current index statistics.
pub struct PhysicalPlanGenerator<'a, D: DataSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DataSource + ?Sized> PhysicalPlanGenerator<'a, D> {
    pub fn new(source: &'a D) -> Self {
        Self { source }
    }

    pub fn generate(&self, logical: &LogicalPlan) -> Result<PhysicalPlan> {
        let (columns, group_by) = match logical.get(logical.root()) {
            LogicalNode::Project { columns, group_by } => (columns, group_by),
            other => {
                return Err(Error::invalid_operation(format!(
                    "plan root must be a projection, found {}",
                    other
                )))
            }
        };

        let leaves: Vec<&Table> = logical
            .leaves(logical.root())
            .into_iter()
            .filter_map(|leaf| match logical.get(leaf) {
                LogicalNode::TableAccess { table } => Some(table),
                _ => None,
            })
            .collect();

        let mut paths = BTreeMap::new();
        for leaf in logical.leaves(logical.root()) {
            if let LogicalNode::TableAccess { table } = logical.get(leaf) {
                if let Some(path) = self.access_path(logical, leaf, table)? {
                    paths.insert(leaf, path);
                }
            }
        }
        let consumed: BTreeSet<NodeId> = paths.values().map(|p| p.select).collect();

        let qualify = leaves.len() > 1;
        let columns = if columns.is_empty() {
            all_columns(&leaves)?
        } else {
            columns.clone()
        };
        let aggregates: Vec<AggregateExpr> = columns
            .iter()
            .filter_map(|expr| match expr {
                Expr::Aggregate(agg) => Some(agg.clone()),
                Expr::Column(_) => None,
            })
            .collect();
        let mut aggregate = (!aggregates.is_empty() || !group_by.is_empty()).then(|| {
            PhysicalNode::Aggregate {
                group_by: group_by.clone(),
                aggregates,
            }
        });

        let mut plan = Tree::new(PhysicalNode::Project { columns, qualify });
        let mut conversion = Conversion {
            logical,
            paths: &mut paths,
            consumed: &consumed,
            plan: &mut plan,
        };
        let root = plan_root(&mut conversion, logical.root(), &mut aggregate)?;
        plan.add_child(plan.root(), root);
        Ok(plan)
    }

    /// Picks the cheapest index able to answer one of the selects sitting
    /// directly above `leaf`, unless a full scan reads fewer rows.
    fn access_path(
        &self,
        logical: &LogicalPlan,
        leaf: NodeId,
        table: &Table,
    ) -> Result<Option<AccessPath>> {
        let store = self
            .source
            .store(table.name())
            .ok_or_else(|| Error::table_not_found(table.name()))?;

        // (cost, prefers unique, declaration position)
        let mut best: Option<((usize, bool, usize), AccessPath)> = None;
        for (select, predicate) in selects_above(logical, leaf) {
            let Predicate::Value(pred) = predicate else {
                continue;
            };
            if pred.column.table != table.effective_name() {
                continue;
            }
            let Some(ranges) = pred.key_ranges() else {
                continue;
            };
            for (position, (column, index)) in store.column_indices().enumerate() {
                if column != pred.column.index {
                    continue;
                }
                let cost: usize = ranges.iter().map(|r| index.cost(Some(r))).sum();
                let rank = (cost, !index.is_unique(), position);
                if best.as_ref().map_or(true, |(current, _)| rank < *current) {
                    best = Some((
                        rank,
                        AccessPath {
                            index: String::from(index.name()),
                            ranges: ranges.clone(),
                            select,
                        },
                    ));
                }
            }
        }

        match best {
            Some(((cost, _, _), path)) if cost <= store.len() => {
                tracing::debug!(
                    table = table.effective_name(),
                    index = %path.index,
                    cost,
                    rows = store.len(),
                    "index range scan"
                );
                Ok(Some(path))
            }
            _ => {
                tracing::debug!(
                    table = table.effective_name(),
                    rows = store.len(),
                    "table scan"
                );
                Ok(None)
            }
        }
    }
}

struct Conversion<'p> {
    logical: &'p LogicalPlan,
    paths: &'p mut BTreeMap<NodeId, AccessPath>,
    consumed: &'p BTreeSet<NodeId>,
    plan: &'p mut PhysicalPlan,
}

/// Converts the child of the logical projection.
fn plan_root(
    conv: &mut Conversion<'_>,
    project: NodeId,
    aggregate: &mut Option<PhysicalNode>,
) -> Result<NodeId> {
    match conv.logical.children(project) {
        [child] => convert(conv, *child, aggregate),
        _ => Err(Error::invalid_operation(
            "projection must have exactly one input",
        )),
    }
}

/// Converts the logical subtree at `id`. The pending aggregate is placed
/// above the first node below the order-by, skip and limit stages.
fn convert(
    conv: &mut Conversion<'_>,
    id: NodeId,
    aggregate: &mut Option<PhysicalNode>,
) -> Result<NodeId> {
    let logical = conv.logical;
    let node = match logical.get(id) {
        LogicalNode::Select { .. } if conv.consumed.contains(&id) => {
            return match logical.children(id) {
                [child] => convert(conv, *child, aggregate),
                _ => Err(Error::invalid_operation("select must have exactly one input")),
            };
        }
        LogicalNode::OrderBy { order_by } => {
            return pass_through(conv, id, PhysicalNode::OrderBy { order_by: order_by.clone() }, aggregate)
        }
        LogicalNode::Skip { count } => {
            return pass_through(conv, id, PhysicalNode::Skip { count: *count }, aggregate)
        }
        LogicalNode::Limit { count } => {
            return pass_through(conv, id, PhysicalNode::Limit { count: *count }, aggregate)
        }
        LogicalNode::TableAccess { table } => match conv.paths.remove(&id) {
            Some(path) => PhysicalNode::IndexRangeScan {
                table: table.clone(),
                index: path.index,
                ranges: path.ranges,
            },
            None => PhysicalNode::TableScan {
                table: table.clone(),
            },
        },
        LogicalNode::Select { predicate } => PhysicalNode::Select {
            predicate: predicate.clone(),
        },
        LogicalNode::CrossProduct => PhysicalNode::CrossProduct,
        LogicalNode::Join { predicate } => PhysicalNode::NestedLoopJoin {
            predicate: predicate.clone(),
        },
        LogicalNode::Project { .. } => {
            return Err(Error::invalid_operation("nested projection"));
        }
    };

    let physical = conv.plan.add(node);
    for child in logical.children(id) {
        let converted = convert(conv, *child, &mut None)?;
        conv.plan.add_child(physical, converted);
    }
    match aggregate.take() {
        Some(agg) => {
            let agg = conv.plan.add(agg);
            conv.plan.add_child(agg, physical);
            Ok(agg)
        }
        None => Ok(physical),
    }
}

fn pass_through(
    conv: &mut Conversion<'_>,
    id: NodeId,
    node: PhysicalNode,
    aggregate: &mut Option<PhysicalNode>,
) -> Result<NodeId> {
    let physical = conv.plan.add(node);
    for child in conv.logical.children(id) {
        let converted = convert(conv, *child, aggregate)?;
        conv.plan.add_child(physical, converted);
    }
    Ok(physical)
}

/// Every column of every table, in table order.
fn all_columns(tables: &[&Table]) -> Result<Vec<Expr>> {
    let mut columns = Vec::new();
    for table in tables {
        for column in table.columns() {
            columns.push(Expr::Column(ColumnRef::of(table, column.name())?));
        }
    }
    Ok(columns)
}

fn fmt_range(range: &KeyRange<Value>) -> String {
    fn lower(v: &Value, exclusive: bool) -> String {
        format!("{}{:?}", if exclusive { "(" } else { "[" }, v)
    }
    fn upper(v: &Value, exclusive: bool) -> String {
        format!("{:?}{}", v, if exclusive { ")" } else { "]" })
    }
    match range {
        KeyRange::All => String::from("[unbound, unbound]"),
        KeyRange::Only(v) => format!("[{:?}, {:?}]", v, v),
        KeyRange::LowerBound { value, exclusive } => {
            format!("{}, unbound]", lower(value, *exclusive))
        }
        KeyRange::UpperBound { value, exclusive } => {
            format!("[unbound, {}", upper(value, *exclusive))
        }
        KeyRange::Bound {
            lower: lo,
            upper: hi,
            lower_exclusive,
            upper_exclusive,
        } => format!(
            "{}, {}",
            lower(lo, *lower_exclusive),
            upper(hi, *upper_exclusive)
        ),
    }
}

fn fmt_table(table: &Table) -> String {
    match table.alias() {
        Some(alias) => format!("{} as {}", table.name(), alias),
        None => String::from(table.name()),
    }
}

impl fmt::Display for PhysicalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalNode::TableScan { table } => write!(f, "table_scan({})", fmt_table(table)),
            PhysicalNode::IndexRangeScan {
                table,
                index,
                ranges,
            } => write!(
                f,
                "index_range_scan({}, {}, {})",
                fmt_table(table),
                index,
                join_names(ranges.iter().map(fmt_range))
            ),
            PhysicalNode::Select { predicate } => write!(f, "select({})", predicate),
            PhysicalNode::CrossProduct => f.write_str("cross_product"),
            PhysicalNode::NestedLoopJoin { predicate } => write!(
                f,
                "nested_loop_join({})",
                Predicate::Join(predicate.clone())
            ),
            PhysicalNode::Aggregate {
                group_by,
                aggregates,
            } => {
                write!(
                    f,
                    "aggregate({})",
                    join_names(aggregates.iter().map(AggregateExpr::output_name))
                )?;
                if !group_by.is_empty() {
                    write!(
                        f,
                        ", groupBy({})",
                        join_names(group_by.iter().map(ColumnRef::normalized_name))
                    )?;
                }
                Ok(())
            }
            PhysicalNode::OrderBy { order_by } => write!(
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
            PhysicalNode::Skip { count } => write!(f, "skip({})", count),
            PhysicalNode::Limit { count } => write!(f, "limit({})", count),
            PhysicalNode::Project { columns, .. } => write!(
                f,
                "project({})",
                join_names(columns.iter().map(|c| c.output_name(true)))
            ),
        }
    }
}

/// Renders a physical plan as indented text.
pub fn explain_physical(plan: &PhysicalPlan) -> String {
    plan.render(|node| format!("{}", node))
}
