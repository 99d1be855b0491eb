use std::sync::Arc;

use crate::catalog::index::IndexInfo;
use crate::catalog::table_heap::TableHeap;
use crate::common::config::TransactionId;
use crate::common::rid::Rid;
use crate::types::tuple::{Tuple, TupleMeta, TupleRecord};
use crate::types::value::Value;

use super::{Executor, ExecutorContext};

/// Marks every child-supplied row deleted and removes its entries from
/// each secondary index, then emits a single row holding the deleted
/// count (section 4.7). Child rows are snapshotted into memory before
/// any mutation so a child scanning the same table can't observe the
/// deletions mid-scan.
pub struct DeleteExecutor {
    table: Arc<TableHeap>,
    indexes: Vec<Arc<IndexInfo>>,
    txn_id: TransactionId,
    child: Box<dyn Executor>,
    done: bool,
}

impl DeleteExecutor {
    pub fn new(ctx: Arc<ExecutorContext>, table_name: String, child: Box<dyn Executor>) -> Self {
        let table_info = ctx
            .catalog
            .get_table_by_name(&table_name)
            .unwrap_or_else(|| panic!("delete from unknown table {table_name}"));
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

impl Executor for DeleteExecutor {
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
            self.table.update_tuple_meta(TupleMeta::deleted(self.txn_id), record.rid);
            for index in &self.indexes {
                let key = index.extract_key(&record.tuple);
                index.index.delete_entry(&key);
            }
            count += 1;
        }

        Some(TupleRecord {
            tuple: Tuple::new(vec![Value::Integer(count)]),
            rid: Rid::new(0, 0),
        })
    }
}
