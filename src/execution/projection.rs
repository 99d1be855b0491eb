use crate::common::rid::Rid;
use crate::expression::Expression;
use crate::types::tuple::{Tuple, TupleRecord};

use super::Executor;

/// Evaluates each expression against the child's tuple and emits the
/// resulting row (section 4.7).
pub struct ProjectionExecutor {
    expressions: Vec<Expression>,
    child: Box<dyn Executor>,
}

impl ProjectionExecutor {
    pub fn new(expressions: Vec<Expression>, child: Box<dyn Executor>) -> Self {
        Self { expressions, child }
    }
}

impl Executor for ProjectionExecutor {
    fn init(&mut self) {
        self.child.init();
    }

    fn next(&mut self) -> Option<TupleRecord> {
        let record = self.child.next()?;
        let values = self.expressions.iter().map(|e| e.evaluate(&record.tuple)).collect();
        Some(TupleRecord { tuple: Tuple::new(values), rid: Rid::new(0, 0) })
    }
}
