//! Property-based tests for plan building and rewriting.
//!
//! These tests verify that the logical plan builder always links the
//! optional stages in precedence order, and that the rewritten plan returns
//! the same rows as the naive plan for randomly generated predicates.

use proptest::prelude::*;
use quarry_core::schema::{Order, Table, TableBuilder};
use quarry_core::{DataType, Row, Value};
use quarry_query::ast::{and, or, ColumnRef, Predicate};
use quarry_query::optimizer::Optimizer;
use quarry_query::planner::{LogicalNode, LogicalPlanBuilder, QueryPlanner};
use quarry_query::query::SelectQuery;
use quarry_storage::TableCache;

const TABLES: [&str; 3] = ["a", "b", "c"];
const COLUMNS: [&str; 3] = ["id", "x", "y"];

fn table(name: &str) -> Table {
    TableBuilder::new(name)
        .unwrap()
        .add_column("id", DataType::Int64)
        .unwrap()
        .add_column("x", DataType::Int64)
        .unwrap()
        .add_column("y", DataType::Int64)
        .unwrap()
        .add_primary_key("id")
        .unwrap()
        .add_index("idxX", "x", false, Order::Asc)
        .unwrap()
        .build()
        .unwrap()
}

fn col(table: &Table, column: usize) -> ColumnRef {
    ColumnRef::of(table, COLUMNS[column % COLUMNS.len()]).unwrap()
}

/// One conjunct of a generated where clause.
#[derive(Clone, Debug)]
enum Atom {
    Value {
        table: usize,
        column: usize,
        op: u8,
        a: i64,
        b: i64,
    },
    Join {
        left: usize,
        right: usize,
        left_column: usize,
        right_column: usize,
    },
    Or {
        left: (usize, usize, i64),
        right: (usize, usize, i64),
    },
}

impl Atom {
    fn to_predicate(&self, tables: &[Table]) -> Predicate {
        let n = tables.len();
        match self {
            Atom::Value {
                table,
                column,
                op,
                a,
                b,
            } => {
                let c = col(&tables[table % n], *column);
                match op % 8 {
                    0 => c.eq(*a),
                    1 => c.ne(*a),
                    2 => c.lt(*a),
                    3 => c.lte(*a),
                    4 => c.gt(*a),
                    5 => c.gte(*a),
                    6 => c.between(*a, *b),
                    _ => c.in_list([*a, *b]),
                }
            }
            Atom::Join {
                left,
                right,
                left_column,
                right_column,
            } => {
                let l = left % n;
                let mut r = right % n;
                if r == l {
                    r = (l + 1) % n;
                }
                col(&tables[l], *left_column).eq_col(&col(&tables[r], *right_column))
            }
            Atom::Or { left, right } => or(vec![
                col(&tables[left.0 % n], left.1).eq(left.2),
                col(&tables[right.0 % n], right.1).eq(right.2),
            ]),
        }
    }
}

fn atom_strategy() -> impl Strategy<Value = Atom> {
    prop_oneof![
        3 => (0..3usize, 0..3usize, 0..8u8, 0..5i64, 0..5i64).prop_map(
            |(table, column, op, a, b)| Atom::Value { table, column, op, a, b }
        ),
        3 => (0..3usize, 0..3usize, 0..3usize, 0..3usize).prop_map(
            |(left, right, left_column, right_column)| Atom::Join {
                left,
                right,
                left_column,
                right_column,
            }
        ),
        1 => ((0..3usize, 0..3usize, 0..5i64), (0..3usize, 0..3usize, 0..5i64))
            .prop_map(|(left, right)| Atom::Or { left, right }),
    ]
}

/// Rows per table as (x, y) pairs; ids follow insertion order.
fn data_strategy() -> impl Strategy<Value = Vec<Vec<(i64, i64)>>> {
    prop::collection::vec(prop::collection::vec((0..5i64, 0..5i64), 0..6), 3)
}

fn cache(tables: &[Table], data: &[Vec<(i64, i64)>]) -> TableCache {
    let mut cache = TableCache::new();
    for (t, rows) in tables.iter().zip(data) {
        cache.create_table(t.clone()).unwrap();
        let store = cache.get_table_mut(t.name()).unwrap();
        for (i, (x, y)) in rows.iter().enumerate() {
            store
                .insert(Row::new(
                    i as u64,
                    vec![Value::Int64(i as i64), Value::Int64(*x), Value::Int64(*y)],
                ))
                .unwrap();
        }
    }
    cache
}

fn sorted_rows(planner: &QueryPlanner, query: &SelectQuery, cache: &TableCache) -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = planner
        .execute(query, cache)
        .unwrap()
        .into_iter()
        .map(|r| r.into_values())
        .collect();
    rows.sort();
    rows
}

proptest! {
    /// Property: the rewritten plan returns the same rows as the naive plan.
    #[test]
    fn rewrite_preserves_results(
        table_count in 2..=3usize,
        atoms in prop::collection::vec(atom_strategy(), 1..5),
        data in data_strategy(),
    ) {
        let tables: Vec<Table> = TABLES[..table_count].iter().map(|t| table(t)).collect();
        let cache = cache(&tables, &data);
        let query = SelectQuery {
            from: tables.clone(),
            where_clause: Some(and(atoms.iter().map(|a| a.to_predicate(&tables)).collect())),
            ..SelectQuery::default()
        };

        let naive = QueryPlanner::with_optimizer(Optimizer::with_passes(vec![]));
        let optimized = QueryPlanner::new();
        prop_assert_eq!(
            sorted_rows(&optimized, &query, &cache),
            sorted_rows(&naive, &query, &cache)
        );
    }

    /// Property: the builder links present stages in precedence order and
    /// attaches every table to the deepest one.
    #[test]
    fn builder_shape(
        table_count in 1..=3usize,
        has_where in any::<bool>(),
        has_order in any::<bool>(),
        limit in prop::option::of(0..10usize),
        skip in prop::option::of(0..10usize),
    ) {
        let tables: Vec<Table> = TABLES[..table_count].iter().map(|t| table(t)).collect();
        let id = col(&tables[0], 0);
        let query = SelectQuery {
            from: tables.clone(),
            where_clause: has_where.then(|| id.gt(1i64)),
            order_by: if has_order { vec![(id.clone(), Order::Asc)] } else { vec![] },
            limit,
            skip,
            ..SelectQuery::default()
        };
        let plan = LogicalPlanBuilder::build(&query);

        // Expected chain below the projection, top to bottom.
        let mut expected = Vec::new();
        if limit.is_some() { expected.push("limit"); }
        if skip.is_some() { expected.push("skip"); }
        if has_order { expected.push("order_by"); }
        if has_where { expected.push("select"); }
        if table_count > 1 { expected.push("cross_product"); }

        let mut chain = Vec::new();
        let mut current = plan.root();
        prop_assert!(matches!(plan.get(current), LogicalNode::Project { .. }), "expected Project node");
        while let [child] = plan.children(current) {
            if plan.get(*child).is_table_access() {
                break;
            }
            current = *child;
            chain.push(match plan.get(current) {
                LogicalNode::Limit { .. } => "limit",
                LogicalNode::Skip { .. } => "skip",
                LogicalNode::OrderBy { .. } => "order_by",
                LogicalNode::Select { .. } => "select",
                LogicalNode::CrossProduct => "cross_product",
                other => panic!("unexpected node {}", other),
            });
        }
        prop_assert_eq!(chain, expected);

        let leaves = plan.children(current);
        prop_assert_eq!(leaves.len(), table_count);
        prop_assert!(leaves.iter().all(|l| plan.get(*l).is_table_access()));
        let cross_products = plan
            .pre_order()
            .into_iter()
            .filter(|id| plan.get(*id).is_cross_product())
            .count();
        prop_assert_eq!(cross_products, usize::from(table_count > 1));
    }
}
