//! The expression tree executors evaluate against a tuple (section 6,
//! "Expression tree (consumed)"). Modeled as a tagged sum type dispatched
//! on kind rather than an open trait-object hierarchy (section 9, "Virtual
//! dispatch"), matching how the teacher's own plan/operator types are
//! shaped.

use crate::types::tuple::Tuple;
use crate::types::value::{DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
}

/// Which side of a join a column reference pulls from. A plain (non-join)
/// scan only ever uses `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleSide {
    Left,
    Right,
}

/// A single node of an expression tree. `evaluate` handles single-tuple
/// contexts (filters, projections); `evaluate_join` handles the two-tuple
/// context a join predicate needs.
#[derive(Debug, Clone)]
pub enum Expression {
    Column {
        side: TupleSide,
        index: usize,
        data_type: DataType,
    },
    Constant(Value),
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logic {
        op: LogicOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn column(index: usize, data_type: DataType) -> Self {
        Expression::Column {
            side: TupleSide::Left,
            index,
            data_type,
        }
    }

    pub fn constant(value: Value) -> Self {
        Expression::Constant(value)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op: ComparisonOp::Eq,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluates against a single tuple (a scan's filter, or a
    /// projection's output expressions). Column references must use
    /// [`TupleSide::Left`].
    pub fn evaluate(&self, tuple: &Tuple) -> Value {
        match self {
            Expression::Column { side, index, .. } => {
                assert_eq!(*side, TupleSide::Left, "single-tuple evaluate can't read the right side");
                tuple.get(*index).clone()
            }
            Expression::Constant(v) => v.clone(),
            Expression::Comparison { op, left, right } => {
                Self::apply_comparison(*op, &left.evaluate(tuple), &right.evaluate(tuple))
            }
            Expression::Arithmetic { op, left, right } => {
                Self::apply_arithmetic(*op, &left.evaluate(tuple), &right.evaluate(tuple))
            }
            Expression::Logic { op, left, right } => {
                Self::apply_logic(*op, &left.evaluate(tuple), &right.evaluate(tuple))
            }
        }
    }

    /// Evaluates against a pair of tuples from a join's two input sides.
    pub fn evaluate_join(&self, left_tuple: &Tuple, right_tuple: &Tuple) -> Value {
        match self {
            Expression::Column { side, index, .. } => match side {
                TupleSide::Left => left_tuple.get(*index).clone(),
                TupleSide::Right => right_tuple.get(*index).clone(),
            },
            Expression::Constant(v) => v.clone(),
            Expression::Comparison { op, left, right } => Self::apply_comparison(
                *op,
                &left.evaluate_join(left_tuple, right_tuple),
                &right.evaluate_join(left_tuple, right_tuple),
            ),
            Expression::Arithmetic { op, left, right } => Self::apply_arithmetic(
                *op,
                &left.evaluate_join(left_tuple, right_tuple),
                &right.evaluate_join(left_tuple, right_tuple),
            ),
            Expression::Logic { op, left, right } => Self::apply_logic(
                *op,
                &left.evaluate_join(left_tuple, right_tuple),
                &right.evaluate_join(left_tuple, right_tuple),
            ),
        }
    }

    /// Rebuilds this node with new children, used by the optimizer's
    /// rewrite rules when lifting sub-expressions into a new plan node
    /// (e.g. extracting a join's equality operands).
    pub fn clone_with_children(&self, children: Vec<Expression>) -> Expression {
        match self {
            Expression::Column { .. } | Expression::Constant(_) => self.clone(),
            Expression::Comparison { op, .. } => {
                let mut it = children.into_iter();
                Expression::Comparison {
                    op: *op,
                    left: Box::new(it.next().expect("comparison needs 2 children")),
                    right: Box::new(it.next().expect("comparison needs 2 children")),
                }
            }
            Expression::Arithmetic { op, .. } => {
                let mut it = children.into_iter();
                Expression::Arithmetic {
                    op: *op,
                    left: Box::new(it.next().expect("arithmetic needs 2 children")),
                    right: Box::new(it.next().expect("arithmetic needs 2 children")),
                }
            }
            Expression::Logic { op, .. } => {
                let mut it = children.into_iter();
                Expression::Logic {
                    op: *op,
                    left: Box::new(it.next().expect("logic needs 2 children")),
                    right: Box::new(it.next().expect("logic needs 2 children")),
                }
            }
        }
    }

    pub fn return_type(&self) -> Option<DataType> {
        match self {
            Expression::Column { data_type, .. } => Some(*data_type),
            Expression::Constant(v) => v.data_type(),
            Expression::Comparison { .. } => Some(DataType::Boolean),
            Expression::Arithmetic { left, .. } => left.return_type(),
            Expression::Logic { .. } => Some(DataType::Boolean),
        }
    }

    /// If this expression is a conjunction (`AND` tree) of equality
    /// comparisons, flattens it into its individual `(left, right)` pairs.
    /// Used by the NLJ→HashJoin rewrite (section 4.8). Returns `None` if
    /// any leaf is not an equality comparison.
    pub fn flatten_equi_conjunction(&self) -> Option<Vec<(Expression, Expression)>> {
        match self {
            Expression::Logic { op: LogicOp::And, left, right } => {
                let mut pairs = left.flatten_equi_conjunction()?;
                pairs.extend(right.flatten_equi_conjunction()?);
                Some(pairs)
            }
            Expression::Comparison { op: ComparisonOp::Eq, left, right } => {
                Some(vec![((**left).clone(), (**right).clone())])
            }
            _ => None,
        }
    }

    /// If this expression is a single equality between a column and a
    /// constant, returns `(column_index, constant)`. Used by the
    /// SeqScan→IndexScan rewrite (section 4.8).
    pub fn as_column_equals_constant(&self) -> Option<(usize, Value)> {
        let Expression::Comparison { op: ComparisonOp::Eq, left, right } = self else {
            return None;
        };
        match (left.as_ref(), right.as_ref()) {
            (Expression::Column { index, .. }, Expression::Constant(v)) => Some((*index, v.clone())),
            (Expression::Constant(v), Expression::Column { index, .. }) => Some((*index, v.clone())),
            _ => None,
        }
    }

    fn apply_comparison(op: ComparisonOp, left: &Value, right: &Value) -> Value {
        if left.is_null() || right.is_null() {
            return Value::Null;
        }
        let ordering = left.compare(right);
        let result = match op {
            ComparisonOp::Eq => ordering.is_eq(),
            ComparisonOp::Ne => ordering.is_ne(),
            ComparisonOp::Lt => ordering.is_lt(),
            ComparisonOp::Le => ordering.is_le(),
            ComparisonOp::Gt => ordering.is_gt(),
            ComparisonOp::Ge => ordering.is_ge(),
        };
        Value::Boolean(result)
    }

    fn apply_arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Value {
        if left.is_null() || right.is_null() {
            return Value::Null;
        }
        match op {
            ArithmeticOp::Add => left.add(right),
            ArithmeticOp::Sub => left.sub(right),
        }
    }

    fn apply_logic(op: LogicOp, left: &Value, right: &Value) -> Value {
        let (Value::Boolean(l), Value::Boolean(r)) = (left, right) else {
            return Value::Null;
        };
        Value::Boolean(match op {
            LogicOp::And => *l && *r,
            LogicOp::Or => *l || *r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(values: Vec<Value>) -> Tuple {
        Tuple::new(values)
    }

    #[test]
    fn column_reference_reads_by_index() {
        let t = tuple(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(Expression::column(1, DataType::Integer).evaluate(&t), Value::Integer(2));
    }

    #[test]
    fn equality_comparison() {
        let t = tuple(vec![Value::Integer(5)]);
        let expr = Expression::eq(Expression::column(0, DataType::Integer), Expression::constant(Value::Integer(5)));
        assert_eq!(expr.evaluate(&t), Value::Boolean(true));
    }

    #[test]
    fn null_propagates_through_comparison() {
        let t = tuple(vec![Value::Null]);
        let expr = Expression::eq(Expression::column(0, DataType::Integer), Expression::constant(Value::Integer(5)));
        assert_eq!(expr.evaluate(&t), Value::Null);
    }

    #[test]
    fn join_evaluate_reads_the_correct_side() {
        let left = tuple(vec![Value::Integer(1)]);
        let right = tuple(vec![Value::Integer(1)]);
        let expr = Expression::eq(
            Expression::Column { side: TupleSide::Left, index: 0, data_type: DataType::Integer },
            Expression::Column { side: TupleSide::Right, index: 0, data_type: DataType::Integer },
        );
        assert_eq!(expr.evaluate_join(&left, &right), Value::Boolean(true));
    }

    #[test]
    fn flattens_equi_conjunction() {
        let expr = Expression::Logic {
            op: LogicOp::And,
            left: Box::new(Expression::eq(
                Expression::Column { side: TupleSide::Left, index: 0, data_type: DataType::Integer },
                Expression::Column { side: TupleSide::Right, index: 0, data_type: DataType::Integer },
            )),
            right: Box::new(Expression::eq(
                Expression::Column { side: TupleSide::Left, index: 1, data_type: DataType::Integer },
                Expression::Column { side: TupleSide::Right, index: 1, data_type: DataType::Integer },
            )),
        };
        assert_eq!(expr.flatten_equi_conjunction().unwrap().len(), 2);
    }

    #[test]
    fn non_equi_conjunction_is_not_flattened() {
        let expr = Expression::Comparison {
            op: ComparisonOp::Lt,
            left: Box::new(Expression::column(0, DataType::Integer)),
            right: Box::new(Expression::constant(Value::Integer(5))),
        };
        assert!(expr.flatten_equi_conjunction().is_none());
    }
}
