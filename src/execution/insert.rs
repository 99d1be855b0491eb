use std::sync::Arc;

use crate::catalog::index::IndexInfo;
use crate::catalog::table_heap::TableHeap;
use crate::common::config::TransactionId;
use crate::common::rid::Rid;
use crate::types::tuple::{Tuple, TupleMeta, TupleRecord};
use crate::types::value::Value;

use super::{Executor, ExecutorContext};

/// Drains its child into the target table and every secondary index on
/// it, then emits a single row holding the inserted count (section
/// 4.7). Idempotent: a second `next` call after the count row has been
/// produced returns `None`.
pub struct InsertExecutor {
    table: Arc<TableHeap>,
    indexes: Vec<Arc<IndexInfo>>,
    txn_id: TransactionId,
    child: Box<dyn Executor>,
    done: bool,
}

impl InsertExecutor {
    pub fn new(ctx: Arc<ExecutorContext>, table_name: String, child: Box<dyn Executor>) -> Self {
        let table_info = ctx
            .catalog
            .get_table_by_name(&table_name)
            .unwrap_or_else(|| panic!("insert into unknown table {table_name}"));
        let indexes = ctx.catalog.get_table_indexes(&table_name);
        Self {
            table: table_info.table.clone(),
            indexes,
            txn_id: ctx.txn_id,
            child,
            done: false,
        }
    }
}

impl Executor for InsertExecutor {
    fn init(&mut self) {
        self.child.init();
        self.done = false;
    }

    fn next(&mut self) -> Option<TupleRecord> {
        if self.done {
            return None;
        }
        self.done = true;

        let mut count = 0i32;
        while let Some(record) = self.child.next() {
            let rid = self
                .table
                .insert_tuple(TupleMeta::new(self.txn_id), record.tuple.clone())
                .expect("table heap insert cannot fail");
            for index in &self.indexes {
                let key = index.extract_key(&record.tuple);
                index.index.insert_entry(&key, rid);
            }
            count += 1;
        }

        Some(TupleRecord {
            tuple: Tuple::new(vec![Value::Integer(count)]),
            rid: Rid::new(0, 0),
        })
    }
}
