//! AST module for query expressions and predicates.

mod expr;
mod predicate;

pub use expr::{AggregateExpr, AggregateFunc, ColumnRef, Expr};
pub use predicate::{
    and, compare_values, or, param, CombinedPredicate, EvalType, JoinPredicate, LogicalOp,
    Operand, Predicate, RowSource, ValuePredicate,
};
