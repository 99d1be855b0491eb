use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::types::tuple::TupleRecord;

use super::plan::OrderDirection;
use super::Executor;
use crate::expression::Expression;

/// Keeps the `limit` best rows seen so far in a plain `Vec`, evicting the
/// current worst element whenever a better row arrives and the buffer is
/// full (section 4.7). A `BinaryHeap` would need a static `Ord` impl for
/// a comparator that's only known at construction time; linear
/// worst-eviction avoids that plumbing at this scale.
pub struct TopNExecutor {
    limit: usize,
    order_by: Vec<(Expression, OrderDirection)>,
    child: Box<dyn Executor>,
    kept: Vec<TupleRecord>,
    output: VecDeque<TupleRecord>,
}

impl TopNExecutor {
    pub fn new(limit: usize, order_by: Vec<(Expression, OrderDirection)>, child: Box<dyn Executor>) -> Self {
        Self { limit, order_by, child, kept: Vec::new(), output: VecDeque::new() }
    }

    /// Orders `a` before `b` per `order_by`'s precedence and direction.
    fn compare(&self, a: &TupleRecord, b: &TupleRecord) -> Ordering {
        for (expr, direction) in &self.order_by {
            let va = expr.evaluate(&a.tuple);
            let vb = expr.evaluate(&b.tuple);
            let ordering = match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => va.compare(&vb),
            };
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl Executor for TopNExecutor {
    fn init(&mut self) {
        self.child.init();
        self.kept.clear();
        self.output.clear();

        if self.limit == 0 {
            return;
        }

        while let Some(record) = self.child.next() {
            if self.kept.len() < self.limit {
                self.kept.push(record);
                continue;
            }
            let worst_idx = self
                .kept
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| self.compare(a, b))
                .map(|(idx, _)| idx)
                .expect("kept is non-empty when full");
            if self.compare(&record, &self.kept[worst_idx]) == Ordering::Less {
                self.kept[worst_idx] = record;
            }
        }

        self.kept.sort_by(|a, b| self.compare(a, b));
        self.output = std::mem::take(&mut self.kept).into();
    }

    fn next(&mut self) -> Option<TupleRecord> {
        self.output.pop_front()
    }
}
