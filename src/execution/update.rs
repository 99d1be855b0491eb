use std::sync::Arc;

use crate::catalog::index::IndexInfo;
use crate::catalog::table_heap::TableHeap;
use crate::common::config::TransactionId;
use crate::common::rid::Rid;
use crate::expression::Expression;
use crate::types::tuple::{Tuple, TupleMeta, TupleRecord};
use crate::types::value::Value;

use super::{Executor, ExecutorContext};

/// Semantically "delete then insert" (section 4.7): marks the original
/// row deleted, evaluates `assignments` against it to build the
/// replacement row, inserts that row at a fresh record id, and rewrites
/// every secondary index entry. Child rows are snapshotted up front —
/// same reasoning as [`super::delete::DeleteExecutor`] — so a
/// self-referential update can't revisit a row it just inserted.
pub struct UpdateExecutor {
    table: Arc<TableHeap>,
    indexes: Vec<Arc<IndexInfo>>,
    txn_id: TransactionId,
    assignments: Vec<Expression>,
    child: Box<dyn Executor>,
    done: bool,
}

impl UpdateExecutor {
    pub fn new(
        ctx: Arc<ExecutorContext>,
        table_name: String,
        assignments: Vec<Expression>,
        child: Box<dyn Executor>,
    ) -> Self {
        let table_info = ctx
            .catalog
            .get_table_by_name(&table_name)
            .unwrap_or_else(|| panic!("update of unknown table {table_name}"));
        let indexes = ctx.catalog.get_table_indexes(&table_name);
        Self {
            table: table_info.table.clone(),
            indexes,
            txn_id: ctx.txn_id,
            assignments,
            child,
            done: false,
        }
    }
}

impl Executor for UpdateExecutor {
    fn init(&mut self) {
        self.child.init();
        self.done = false;
    }

    fn next(&mut self) -> Option<TupleRecord> {
        if self.done {
            return None;
        }
        self.done = true;

        let mut pending = Vec::new();
        while let Some(record) = self.child.next() {
            pending.push(record);
        }

        let mut count = 0i32;
        for record in pending {
            let new_tuple = Tuple::new(self.assignments.iter().map(|e| e.evaluate(&record.tuple)).collect());

            self.table.update_tuple_meta(TupleMeta::deleted(self.txn_id), record.rid);
            let new_rid = self
                .table
                .insert_tuple(TupleMeta::new(self.txn_id), new_tuple.clone())
                .expect("table heap insert cannot fail");

            for index in &self.indexes {
                let old_key = index.extract_key(&record.tuple);
                index.index.delete_entry(&old_key);
                let new_key = index.extract_key(&new_tuple);
                index.index.insert_entry(&new_key, new_rid);
            }
            count += 1;
        }

        Some(TupleRecord {
            tuple: Tuple::new(vec![Value::Integer(count)]),
            rid: Rid::new(0, 0),
        })
    }
}
