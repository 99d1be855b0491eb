use std::collections::VecDeque;
use std::sync::Arc;

use crate::catalog::table_heap::TableHeap;
use crate::common::rid::Rid;
use crate::expression::Expression;
use crate::types::tuple::TupleRecord;
use crate::types::value::Value;

use super::{Executor, ExecutorContext};

/// Walks every row of a table heap, skipping logically deleted rows and
/// — if a filter was pushed down — rows the predicate doesn't satisfy
/// (section 4.7).
pub struct SeqScanExecutor {
    table: Arc<TableHeap>,
    filter: Option<Expression>,
    pending: VecDeque<Rid>,
}

impl SeqScanExecutor {
    pub fn new(ctx: Arc<ExecutorContext>, table_name: String, filter: Option<Expression>) -> Self {
        let table = ctx
            .catalog
            .get_table_by_name(&table_name)
            .unwrap_or_else(|| panic!("seq scan over unknown table {table_name}"))
            .table
            .clone();
        Self { table, filter, pending: VecDeque::new() }
    }
}

impl Executor for SeqScanExecutor {
    fn init(&mut self) {
        self.pending = self.table.make_iterator().into();
    }

    fn next(&mut self) -> Option<TupleRecord> {
        while let Some(rid) = self.pending.pop_front() {
            let Some((meta, tuple)) = self.table.get_tuple(rid) else {
                continue;
            };
            if meta.is_deleted {
                continue;
            }
            if let Some(filter) = &self.filter {
                if !matches!(filter.evaluate(&tuple), Value::Boolean(true)) {
                    continue;
                }
            }
            return Some(TupleRecord { tuple, rid });
        }
        None
    }
}
