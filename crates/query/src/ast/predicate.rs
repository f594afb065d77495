//! Predicate definitions for query filtering.
//!
//! A [`Predicate`] is a tree of leaf comparisons and `AND`/`OR` combinators.
//! Leaves compare a column either to operands ([`ValuePredicate`]) or to
//! another column ([`JoinPredicate`]). Operands may be placeholders created
//! with [`param`]; a predicate holding an unbound placeholder evaluates to
//! false everywhere and must be bound before execution.

use crate::ast::expr::ColumnRef;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use quarry_core::{DataType, Error, Result, Value};
use quarry_index::KeyRange;

/// Evaluation type for predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalType {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    In,
    IsNull,
    IsNotNull,
}

impl EvalType {
    fn symbol(&self) -> &'static str {
        match self {
            EvalType::Eq => "=",
            EvalType::Ne => "!=",
            EvalType::Lt => "<",
            EvalType::Le => "<=",
            EvalType::Gt => ">",
            EvalType::Ge => ">=",
            EvalType::Between => "between",
            EvalType::In => "in",
            EvalType::IsNull => "is null",
            EvalType::IsNotNull => "is not null",
        }
    }

    /// Returns the operator seen from the other side (`a < b` is `b > a`).
    pub fn reverse(&self) -> EvalType {
        match self {
            EvalType::Lt => EvalType::Gt,
            EvalType::Le => EvalType::Ge,
            EvalType::Gt => EvalType::Lt,
            EvalType::Ge => EvalType::Le,
            other => *other,
        }
    }

    fn test(&self, ord: Ordering) -> bool {
        match self {
            EvalType::Eq => ord == Ordering::Equal,
            EvalType::Ne => ord != Ordering::Equal,
            EvalType::Lt => ord == Ordering::Less,
            EvalType::Le => ord != Ordering::Greater,
            EvalType::Gt => ord == Ordering::Greater,
            EvalType::Ge => ord != Ordering::Less,
            _ => false,
        }
    }
}

/// Logical combinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A constant or a positional placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(Value),
    Param { index: usize, bound: Option<Value> },
}

impl Operand {
    /// Returns the value, or `None` for an unbound placeholder.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Operand::Literal(v) => Some(v),
            Operand::Param { bound, .. } => bound.as_ref(),
        }
    }

    fn is_bound(&self) -> bool {
        self.value().is_some()
    }
}

/// Creates the placeholder for slot `index` of the bind array.
pub fn param(index: usize) -> Operand {
    Operand::Param { index, bound: None }
}

macro_rules! impl_operand_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Literal(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from!(bool, i32, i64, f64, String, &str);

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Literal(v)
    }
}

/// Compares two non-null values; numeric types compare by value.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    Some(a.cmp(b))
}

/// Provides the value of a column for the row being evaluated.
pub trait RowSource {
    fn value(&self, column: &ColumnRef) -> Option<&Value>;
}

/// Compares a column to one or more operands.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuePredicate {
    pub column: ColumnRef,
    pub eval_type: EvalType,
    pub operands: Vec<Operand>,
}

impl ValuePredicate {
    pub fn new(column: ColumnRef, eval_type: EvalType, operands: Vec<Operand>) -> Self {
        let operands = operands
            .into_iter()
            .map(|op| match op {
                Operand::Literal(v) => Operand::Literal(v.widen_to(column.data_type)),
                other => other,
            })
            .collect();
        let mut pred = Self {
            column,
            eval_type,
            operands,
        };
        pred.normalize_between();
        pred
    }

    /// Orders the two bounds of a fully known `between` as `(min, max)`.
    fn normalize_between(&mut self) {
        if self.eval_type != EvalType::Between || self.operands.len() != 2 {
            return;
        }
        if let (Some(a), Some(b)) = (self.operands[0].value(), self.operands[1].value()) {
            if a > b {
                self.operands.swap(0, 1);
            }
        }
    }

    fn is_bound(&self) -> bool {
        self.operands.iter().all(Operand::is_bound)
    }

    /// Evaluates against a single column value.
    pub fn eval_value(&self, value: &Value) -> bool {
        if !self.is_bound() {
            return false;
        }
        match self.eval_type {
            EvalType::IsNull => value.is_null(),
            EvalType::IsNotNull => !value.is_null(),
            _ if value.is_null() => false,
            EvalType::Between => match (self.operand(0), self.operand(1)) {
                (Some(lo), Some(hi)) => {
                    compare_values(value, lo).is_some_and(|o| o != Ordering::Less)
                        && compare_values(value, hi).is_some_and(|o| o != Ordering::Greater)
                }
                _ => false,
            },
            EvalType::In => self
                .operands
                .iter()
                .filter_map(Operand::value)
                .any(|v| compare_values(value, v) == Some(Ordering::Equal)),
            eval_type => self
                .operand(0)
                .and_then(|v| compare_values(value, v))
                .is_some_and(|ord| eval_type.test(ord)),
        }
    }

    fn operand(&self, i: usize) -> Option<&Value> {
        self.operands.get(i).and_then(Operand::value)
    }

    /// Key ranges an ordered index on the column must scan to find the
    /// matching rows, or `None` when the predicate cannot use an index.
    pub fn key_ranges(&self) -> Option<Vec<KeyRange<Value>>> {
        if !self.is_bound() {
            return None;
        }
        let first = self.operand(0).filter(|v| !v.is_null()).cloned();
        let ranges = match self.eval_type {
            EvalType::Eq => vec![KeyRange::only(first?)],
            EvalType::Lt => vec![KeyRange::upper_bound(first?, true)],
            EvalType::Le => vec![KeyRange::upper_bound(first?, false)],
            EvalType::Gt => vec![KeyRange::lower_bound(first?, true)],
            EvalType::Ge => vec![KeyRange::lower_bound(first?, false)],
            EvalType::Between => {
                let hi = self.operand(1).filter(|v| !v.is_null()).cloned();
                vec![KeyRange::bound(first?, hi?, false, false)]
            }
            EvalType::In => {
                let mut keys: Vec<Value> = self
                    .operands
                    .iter()
                    .filter_map(Operand::value)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .collect();
                keys.sort();
                keys.dedup();
                keys.into_iter().map(KeyRange::only).collect()
            }
            EvalType::Ne | EvalType::IsNull | EvalType::IsNotNull => return None,
        };
        Some(ranges)
    }
}

/// Compares two columns, usually of different tables.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinPredicate {
    pub left: ColumnRef,
    pub right: ColumnRef,
    pub eval_type: EvalType,
}

impl JoinPredicate {
    pub fn new(left: ColumnRef, right: ColumnRef, eval_type: EvalType) -> Self {
        Self {
            left,
            right,
            eval_type,
        }
    }

    /// Swaps the two sides, adjusting the operator.
    pub fn reverse(&self) -> Self {
        Self {
            left: self.right.clone(),
            right: self.left.clone(),
            eval_type: self.eval_type.reverse(),
        }
    }

    pub fn is_equi_join(&self) -> bool {
        self.eval_type == EvalType::Eq
    }

    pub fn eval_values(&self, left: &Value, right: &Value) -> bool {
        compare_values(left, right).is_some_and(|ord| self.eval_type.test(ord))
    }
}

/// `AND` / `OR` over any number of children.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedPredicate {
    pub op: LogicalOp,
    pub children: Vec<Predicate>,
}

/// A boolean condition over the columns of one or more tables.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Value(ValuePredicate),
    Join(JoinPredicate),
    Combined(CombinedPredicate),
}

/// Conjunction of `preds`. A single predicate is returned as is.
pub fn and(mut preds: Vec<Predicate>) -> Predicate {
    if preds.len() == 1 {
        return preds.remove(0);
    }
    Predicate::Combined(CombinedPredicate {
        op: LogicalOp::And,
        children: preds,
    })
}

/// Disjunction of `preds`. A single predicate is returned as is.
pub fn or(mut preds: Vec<Predicate>) -> Predicate {
    if preds.len() == 1 {
        return preds.remove(0);
    }
    Predicate::Combined(CombinedPredicate {
        op: LogicalOp::Or,
        children: preds,
    })
}

impl Predicate {
    /// Evaluates against the row provided by `source`.
    pub fn eval<S: RowSource + ?Sized>(&self, source: &S) -> bool {
        match self {
            Predicate::Value(p) => source
                .value(&p.column)
                .is_some_and(|value| p.eval_value(value)),
            Predicate::Join(p) => match (source.value(&p.left), source.value(&p.right)) {
                (Some(l), Some(r)) => p.eval_values(l, r),
                _ => false,
            },
            Predicate::Combined(c) => match c.op {
                LogicalOp::And => c.children.iter().all(|child| child.eval(source)),
                LogicalOp::Or => c.children.iter().any(|child| child.eval(source)),
            },
        }
    }

    /// Returns every column referenced, leaves first to last.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Predicate::Value(p) => out.push(&p.column),
            Predicate::Join(p) => {
                out.push(&p.left);
                out.push(&p.right);
            }
            Predicate::Combined(c) => c.children.iter().for_each(|ch| ch.collect_columns(out)),
        }
    }

    /// Returns the effective names of the tables referenced.
    pub fn tables(&self) -> BTreeSet<String> {
        self.columns().into_iter().map(|c| c.table.clone()).collect()
    }

    /// Children of a combinator; leaves have none.
    pub fn children(&self) -> &[Predicate] {
        match self {
            Predicate::Combined(c) => &c.children,
            _ => &[],
        }
    }

    pub fn is_and(&self) -> bool {
        matches!(self, Predicate::Combined(c) if c.op == LogicalOp::And)
    }

    /// Splits nested conjunctions into their conjuncts, in order.
    pub fn flatten_and(self) -> Vec<Predicate> {
        match self {
            Predicate::Combined(c) if c.op == LogicalOp::And => {
                c.children.into_iter().flat_map(Predicate::flatten_and).collect()
            }
            other => vec![other],
        }
    }

    fn for_each_operand<'a>(&'a self, f: &mut impl FnMut(&'a ColumnRef, &'a Operand)) {
        match self {
            Predicate::Value(p) => p.operands.iter().for_each(|op| f(&p.column, op)),
            Predicate::Join(_) => {}
            Predicate::Combined(c) => c.children.iter().for_each(|ch| ch.for_each_operand(f)),
        }
    }

    /// Number of bind slots the predicate expects: highest index plus one.
    pub fn param_count(&self) -> usize {
        let mut count = 0;
        self.for_each_operand(&mut |_, op| {
            if let Operand::Param { index, .. } = op {
                count = count.max(index + 1);
            }
        });
        count
    }

    /// Returns true if no placeholder is left unbound.
    pub fn is_bound(&self) -> bool {
        let mut bound = true;
        self.for_each_operand(&mut |_, op| bound &= op.is_bound());
        bound
    }

    /// Checks literal operand types against their columns and that joined
    /// columns share a type.
    pub fn validate(&self) -> Result<()> {
        match self {
            Predicate::Value(p) => p
                .operands
                .iter()
                .filter_map(|op| match op {
                    Operand::Literal(v) => Some(v),
                    Operand::Param { .. } => None,
                })
                .try_for_each(|v| check_operand(&p.column, v, |msg| Error::data(msg))),
            Predicate::Join(p) if p.left.data_type != p.right.data_type => Err(Error::data(
                format!(
                    "cannot compare {} ({}) with {} ({})",
                    p.left.normalized_name(),
                    p.left.data_type.name(),
                    p.right.normalized_name(),
                    p.right.data_type.name()
                ),
            )),
            Predicate::Join(_) => Ok(()),
            Predicate::Combined(c) => c.children.iter().try_for_each(Predicate::validate),
        }
    }

    /// Returns a copy with every placeholder resolved from `values`.
    pub fn bind(&self, values: &[Value]) -> Result<Predicate> {
        let expected = self.param_count();
        if values.len() != expected {
            return Err(Error::syntax(format!(
                "expected {} bound values, got {}",
                expected,
                values.len()
            )));
        }
        let mut bound = self.clone();
        bound.bind_in_place(values)?;
        Ok(bound)
    }

    fn bind_in_place(&mut self, values: &[Value]) -> Result<()> {
        match self {
            Predicate::Value(p) => {
                for op in p.operands.iter_mut() {
                    if let Operand::Param { index, bound } = op {
                        let value = values.get(*index).cloned().ok_or_else(|| {
                            Error::syntax(format!("no value bound for placeholder {}", index))
                        })?;
                        let value = value.widen_to(p.column.data_type);
                        check_operand(&p.column, &value, |msg| Error::syntax(msg))?;
                        *bound = Some(value);
                    }
                }
                p.normalize_between();
                Ok(())
            }
            Predicate::Join(_) => Ok(()),
            Predicate::Combined(c) => c
                .children
                .iter_mut()
                .try_for_each(|child| child.bind_in_place(values)),
        }
    }
}

fn check_operand(column: &ColumnRef, value: &Value, err: fn(String) -> Error) -> Result<()> {
    if value.conforms_to(column.data_type) {
        return Ok(());
    }
    Err(err(format!(
        "{} expects {}, got {}",
        column.normalized_name(),
        column.data_type.name(),
        value.data_type().map(|t| t.name()).unwrap_or("null")
    )))
}

impl From<ValuePredicate> for Predicate {
    fn from(p: ValuePredicate) -> Self {
        Predicate::Value(p)
    }
}

impl From<JoinPredicate> for Predicate {
    fn from(p: JoinPredicate) -> Self {
        Predicate::Join(p)
    }
}

/// Predicate constructors on columns.
impl ColumnRef {
    fn cmp_pred(&self, eval_type: EvalType, operands: Vec<Operand>) -> Predicate {
        Predicate::Value(ValuePredicate::new(self.clone(), eval_type, operands))
    }

    pub fn eq(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Eq, vec![v.into()])
    }

    pub fn ne(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Ne, vec![v.into()])
    }

    pub fn lt(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Lt, vec![v.into()])
    }

    pub fn lte(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Le, vec![v.into()])
    }

    pub fn gt(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Gt, vec![v.into()])
    }

    pub fn gte(&self, v: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Ge, vec![v.into()])
    }

    /// Inclusive range. Bounds given in either order are normalized to
    /// `(min, max)` once both are known.
    pub fn between(&self, from: impl Into<Operand>, to: impl Into<Operand>) -> Predicate {
        self.cmp_pred(EvalType::Between, vec![from.into(), to.into()])
    }

    pub fn in_list<V: Into<Operand>>(&self, values: impl IntoIterator<Item = V>) -> Predicate {
        self.cmp_pred(EvalType::In, values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> Predicate {
        self.cmp_pred(EvalType::IsNull, Vec::new())
    }

    pub fn is_not_null(&self) -> Predicate {
        self.cmp_pred(EvalType::IsNotNull, Vec::new())
    }

    /// Column-to-column comparison.
    pub fn join(&self, eval_type: EvalType, other: &ColumnRef) -> Predicate {
        Predicate::Join(JoinPredicate::new(self.clone(), other.clone(), eval_type))
    }

    /// Column-to-column equality.
    pub fn eq_col(&self, other: &ColumnRef) -> Predicate {
        self.join(EvalType::Eq, other)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) | Operand::Param { bound: Some(v), .. } => write!(f, "{:?}", v),
            Operand::Param { index, bound: None } => write!(f, "?{}", index),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Value(p) => {
                write!(f, "{} {}", p.column.normalized_name(), p.eval_type.symbol())?;
                match p.eval_type {
                    EvalType::IsNull | EvalType::IsNotNull => Ok(()),
                    EvalType::Between if p.operands.len() == 2 => {
                        write!(f, " {} and {}", p.operands[0], p.operands[1])
                    }
                    _ if p.operands.len() == 1 => write!(f, " {}", p.operands[0]),
                    _ => {
                        f.write_str(" (")?;
                        for (i, op) in p.operands.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", op)?;
                        }
                        f.write_str(")")
                    }
                }
            }
            Predicate::Join(p) => write!(
                f,
                "{} {} {}",
                p.left.normalized_name(),
                p.eval_type.symbol(),
                p.right.normalized_name()
            ),
            Predicate::Combined(c) => {
                f.write_str(match c.op {
                    LogicalOp::And => "and(",
                    LogicalOp::Or => "or(",
                })?;
                for (i, child) in c.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use quarry_core::ErrorKind;

    struct Values(Vec<(ColumnRef, Value)>);

    impl RowSource for Values {
        fn value(&self, column: &ColumnRef) -> Option<&Value> {
            self.0
                .iter()
                .find(|(c, _)| c.same_column(column))
                .map(|(_, v)| v)
        }
    }

    fn salary() -> ColumnRef {
        ColumnRef::new("job", "maxSalary", 1, DataType::Float64)
    }

    fn title() -> ColumnRef {
        ColumnRef::new("job", "title", 0, DataType::String)
    }

    fn dept_id() -> ColumnRef {
        ColumnRef::new("department", "id", 0, DataType::String)
    }

    fn emp_dept() -> ColumnRef {
        ColumnRef::new("employee", "departmentId", 3, DataType::String)
    }

    fn row(title: &str, salary: f64) -> Values {
        Values(vec![
            (self::title(), Value::String(title.into())),
            (self::salary(), Value::Float64(salary)),
        ])
    }

    #[test]
    fn test_comparisons() {
        let r = row("Engineer", 5000.0);
        assert!(salary().eq(5000.0).eval(&r));
        assert!(salary().gt(1000).eval(&r));
        assert!(salary().lte(5000).eval(&r));
        assert!(!salary().lt(5000).eval(&r));
        assert!(salary().ne(1.0).eval(&r));
        assert!(title().in_list(["Manager", "Engineer"]).eval(&r));
        assert!(!title().in_list(["Manager"]).eval(&r));
        assert!(title().is_not_null().eval(&r));
    }

    #[test]
    fn test_null_only_matches_null_checks() {
        let r = Values(vec![(salary(), Value::Null)]);
        assert!(salary().is_null().eval(&r));
        assert!(!salary().eq(1.0).eval(&r));
        assert!(!salary().ne(1.0).eval(&r));
        assert!(!salary().lt(1.0).eval(&r));
    }

    #[test]
    fn test_between_normalizes_bounds() {
        let r = row("x", 50.0);
        let pred = salary().between(100.0, 10.0);
        assert!(pred.eval(&r));
        assert_eq!(pred.to_string(), "job.maxSalary between Float64(10.0) and Float64(100.0)");

        let bound = salary().between(param(0), param(1));
        let bound = bound.bind(&[Value::Float64(60.0), Value::Float64(40.0)]).unwrap();
        assert!(bound.eval(&r));
    }

    #[test]
    fn test_combinators() {
        let r = row("Engineer", 5000.0);
        assert!(and(vec![salary().gt(1000), title().eq("Engineer")]).eval(&r));
        assert!(!and(vec![salary().gt(9000), title().eq("Engineer")]).eval(&r));
        assert!(or(vec![salary().gt(9000), title().eq("Engineer")]).eval(&r));
        assert_eq!(and(vec![salary().gt(1)]), salary().gt(1));
    }

    #[test]
    fn test_join_predicate() {
        let r = Values(vec![
            (dept_id(), Value::String("d1".into())),
            (emp_dept(), Value::String("d1".into())),
        ]);
        let pred = emp_dept().eq_col(&dept_id());
        assert!(pred.eval(&r));
        assert_eq!(pred.tables().len(), 2);
        assert!(pred.validate().is_ok());
        assert!(emp_dept().eq_col(&salary()).validate().is_err());

        let lt = JoinPredicate::new(salary(), salary(), EvalType::Lt).reverse();
        assert_eq!(lt.eval_type, EvalType::Gt);
    }

    #[test]
    fn test_columns_and_flatten() {
        let pred = and(vec![
            and(vec![salary().gt(1), title().eq("a")]),
            emp_dept().eq_col(&dept_id()),
        ]);
        assert_eq!(pred.columns().len(), 4);
        assert_eq!(pred.children().len(), 2);
        let conjuncts = pred.flatten_and();
        assert_eq!(conjuncts.len(), 3);
        assert!(conjuncts.iter().all(|c| !c.is_and()));

        let mixed = or(vec![and(vec![salary().gt(1), salary().lt(5)]), title().eq("a")]);
        assert_eq!(mixed.flatten_and().len(), 1);
    }

    #[test]
    fn test_unbound_is_not_evaluable() {
        let r = row("Engineer", 5000.0);
        let pred = salary().gt(param(0));
        assert!(!pred.is_bound());
        assert!(!pred.eval(&r));
        assert_eq!(pred.param_count(), 1);

        let bound = pred.bind(&[Value::Float64(10.0)]).unwrap();
        assert!(bound.is_bound());
        assert!(bound.eval(&r));
        assert!(!pred.is_bound());
    }

    #[test]
    fn test_bind_errors() {
        let pred = and(vec![salary().gt(param(0)), title().eq(param(1))]);
        assert_eq!(pred.param_count(), 2);

        let err = pred.bind(&[Value::Float64(1.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let err = pred
            .bind(&[Value::String("x".into()), Value::String("y".into())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        // Integers widen to the float column.
        assert!(pred.bind(&[Value::Int32(1), Value::String("y".into())]).is_ok());
    }

    #[test]
    fn test_validate_literals() {
        assert!(salary().gt(10).validate().is_ok());
        let err = salary().eq("ten").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(and(vec![title().eq("a"), title().eq(1)]).validate().is_err());
    }

    #[test]
    fn test_key_ranges() {
        let eq = ValuePredicate::new(salary(), EvalType::Eq, vec![Operand::from(1.0)]);
        assert_eq!(eq.key_ranges(), Some(vec![KeyRange::only(Value::Float64(1.0))]));

        let gt = ValuePredicate::new(salary(), EvalType::Gt, vec![Operand::from(1.0)]);
        assert_eq!(
            gt.key_ranges(),
            Some(vec![KeyRange::lower_bound(Value::Float64(1.0), true)])
        );

        let within = ValuePredicate::new(
            title(),
            EvalType::In,
            vec![Operand::from("b"), Operand::from("a"), Operand::from("b")],
        );
        assert_eq!(within.key_ranges().map(|r| r.len()), Some(2));

        let ne = ValuePredicate::new(salary(), EvalType::Ne, vec![Operand::from(1.0)]);
        assert!(ne.key_ranges().is_none());
        let unbound = ValuePredicate::new(salary(), EvalType::Eq, vec![param(0)]);
        assert!(unbound.key_ranges().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = and(vec![salary().gt(1), title().eq("a")]);
        let mut copy = original.clone();
        if let Predicate::Combined(c) = &mut copy {
            c.children.pop();
        }
        assert_eq!(original.children().len(), 2);
        assert_eq!(copy.children().len(), 1);
    }
}
