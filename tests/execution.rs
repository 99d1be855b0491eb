//! Integration tests exercising the executors end-to-end against a real
//! catalog, table heap, and hash index (section 8's "Concrete scenarios").
//! Unlike the module-local unit tests, these drive a whole small plan
//! tree the way a caller actually would: build a child executor,
//! `init()`, pull to exhaustion.

use std::sync::Arc;

use tempdir::TempDir;
use tinybase::buffer::BufferPoolManager;
use tinybase::catalog::Catalog;
use tinybase::execution::{AggregateType, Executor, ExecutorContext, OrderDirection};
use tinybase::execution::aggregation::AggregationExecutor;
use tinybase::execution::delete::DeleteExecutor;
use tinybase::execution::insert::InsertExecutor;
use tinybase::execution::seq_scan::SeqScanExecutor;
use tinybase::execution::topn::TopNExecutor;
use tinybase::execution::update::UpdateExecutor;
use tinybase::expression::Expression;
use tinybase::storage::disk::DiskManager;
use tinybase::types::schema::{Column, Schema};
use tinybase::types::tuple::{Tuple, TupleRecord};
use tinybase::types::value::{DataType, Value};

/// A fixed, in-memory row source for feeding literal rows into a mutator
/// executor under test -- the role a `Values` plan node would play.
struct LiteralExecutor {
    rows: Vec<Tuple>,
    pos: usize,
}

impl LiteralExecutor {
    fn new(rows: Vec<Tuple>) -> Self {
        Self { rows, pos: 0 }
    }
}

impl Executor for LiteralExecutor {
    fn init(&mut self) {
        self.pos = 0;
    }

    fn next(&mut self) -> Option<TupleRecord> {
        let tuple = self.rows.get(self.pos)?.clone();
        self.pos += 1;
        Some(TupleRecord { tuple, rid: tinybase::common::Rid::new(0, 0) })
    }
}

fn test_context() -> (Arc<ExecutorContext>, Arc<Catalog>) {
    let dir = TempDir::new("execution_test").unwrap();
    let db_file = dir.path().join("test.db");
    std::mem::forget(dir);
    let disk_manager = DiskManager::new(db_file.to_str().unwrap()).unwrap();
    let bpm = Arc::new(BufferPoolManager::new(64, disk_manager, 2));
    let catalog = Arc::new(Catalog::new(bpm));
    let ctx = Arc::new(ExecutorContext::new(catalog.clone(), 1));
    (ctx, catalog)
}

fn drain(exec: &mut dyn Executor) -> Vec<Tuple> {
    exec.init();
    let mut out = Vec::new();
    while let Some(record) = exec.next() {
        out.push(record.tuple);
    }
    out
}

#[test]
fn insert_then_seq_scan_round_trips() {
    let (ctx, catalog) = test_context();
    let schema = Schema::new(vec![Column::new("id", DataType::Integer)]);
    catalog.create_table("t", schema);

    let rows = vec![Tuple::new(vec![Value::Integer(1)]), Tuple::new(vec![Value::Integer(2)])];
    let mut insert = InsertExecutor::new(ctx.clone(), "t".into(), Box::new(LiteralExecutor::new(rows)));
    let inserted = drain(&mut insert);
    assert_eq!(inserted, vec![Tuple::new(vec![Value::Integer(2)])]); // row count

    // idempotent: a second pull produces nothing further
    assert!(insert.next().is_none());

    let mut scan = SeqScanExecutor::new(ctx, "t".into(), None);
    let mut results = drain(&mut scan);
    results.sort_by_key(|t| match t.get(0) {
        Value::Integer(v) => *v,
        _ => unreachable!(),
    });
    assert_eq!(results, vec![Tuple::new(vec![Value::Integer(1)]), Tuple::new(vec![Value::Integer(2)])]);
}

#[test]
fn seq_scan_filter_skips_non_matching_rows() {
    let (ctx, catalog) = test_context();
    catalog.create_table("t", Schema::new(vec![Column::new("id", DataType::Integer)]));

    let rows = (0..5).map(|i| Tuple::new(vec![Value::Integer(i)])).collect();
    { let mut e = InsertExecutor::new(ctx.clone(), "t".into(), Box::new(LiteralExecutor::new(rows))); e.init(); e.next(); }

    let filter = Expression::eq(Expression::column(0, DataType::Integer), Expression::constant(Value::Integer(3)));
    let mut scan = SeqScanExecutor::new(ctx, "t".into(), Some(filter));
    let results = drain(&mut scan);
    assert_eq!(results, vec![Tuple::new(vec![Value::Integer(3)])]);
}

#[test]
fn delete_removes_rows_and_index_entries() {
    let (ctx, catalog) = test_context();
    catalog.create_table("t", Schema::new(vec![Column::new("id", DataType::Integer)]));
    catalog.create_index("t_id_idx", "t", vec![0]);

    let rows = vec![Tuple::new(vec![Value::Integer(1)]), Tuple::new(vec![Value::Integer(2)])];
    { let mut e = InsertExecutor::new(ctx.clone(), "t".into(), Box::new(LiteralExecutor::new(rows))); e.init(); e.next(); }

    let index = catalog.get_index_by_name("t_id_idx").unwrap();
    let key = Tuple::new(vec![Value::Integer(1)]);
    assert!(index.index.scan_key(&key).is_some());

    let scan = SeqScanExecutor::new(ctx.clone(), "t".into(), Some(Expression::eq(
        Expression::column(0, DataType::Integer),
        Expression::constant(Value::Integer(1)),
    )));
    let mut delete = DeleteExecutor::new(ctx.clone(), "t".into(), Box::new(scan));
    let result = drain(&mut delete);
    assert_eq!(result, vec![Tuple::new(vec![Value::Integer(1)])]); // deleted count

    assert!(index.index.scan_key(&key).is_none());

    let mut rescan = SeqScanExecutor::new(ctx, "t".into(), None);
    let remaining = drain(&mut rescan);
    assert_eq!(remaining, vec![Tuple::new(vec![Value::Integer(2)])]);
}

#[test]
fn update_rewrites_index_entries_and_terminates_on_self_reference() {
    let (ctx, catalog) = test_context();
    catalog.create_table("t", Schema::new(vec![Column::new("id", DataType::Integer)]));
    catalog.create_index("t_id_idx", "t", vec![0]);

    let rows = vec![Tuple::new(vec![Value::Integer(1)]), Tuple::new(vec![Value::Integer(2)])];
    { let mut e = InsertExecutor::new(ctx.clone(), "t".into(), Box::new(LiteralExecutor::new(rows))); e.init(); e.next(); }

    // self-referential update: scans the same table it writes to.
    let scan = SeqScanExecutor::new(ctx.clone(), "t".into(), None);
    let assignments = vec![Expression::Arithmetic {
        op: tinybase::expression::ArithmeticOp::Add,
        left: Box::new(Expression::column(0, DataType::Integer)),
        right: Box::new(Expression::constant(Value::Integer(10))),
    }];
    let mut update = UpdateExecutor::new(ctx.clone(), "t".into(), assignments, Box::new(scan));
    let result = drain(&mut update);
    // must terminate, and must have updated exactly the 2 original rows,
    // not re-scanned the freshly inserted replacements.
    assert_eq!(result, vec![Tuple::new(vec![Value::Integer(2)])]);

    let index = catalog.get_index_by_name("t_id_idx").unwrap();
    assert!(index.index.scan_key(&Tuple::new(vec![Value::Integer(1)])).is_none());
    assert!(index.index.scan_key(&Tuple::new(vec![Value::Integer(11)])).is_some());
    assert!(index.index.scan_key(&Tuple::new(vec![Value::Integer(12)])).is_some());
}

#[test]
fn aggregation_group_by_count() {
    let (ctx, catalog) = test_context();
    catalog.create_table(
        "events",
        Schema::new(vec![Column::new("camp", DataType::Varchar), Column::new("n", DataType::Integer)]),
    );
    let rows = vec![
        Tuple::new(vec![Value::Varchar("A".into()), Value::Integer(10)]),
        Tuple::new(vec![Value::Varchar("A".into()), Value::Integer(20)]),
        Tuple::new(vec![Value::Varchar("B".into()), Value::Integer(30)]),
    ];
    { let mut e = InsertExecutor::new(ctx.clone(), "events".into(), Box::new(LiteralExecutor::new(rows))); e.init(); e.next(); }

    let scan = Box::new(SeqScanExecutor::new(ctx, "events".into(), None));
    let mut agg = AggregationExecutor::new(
        vec![Expression::column(0, DataType::Varchar)],
        vec![(AggregateType::Count, Expression::column(1, DataType::Integer))],
        scan,
    );
    let mut results = drain(&mut agg);
    results.sort_by(|a, b| format!("{}", a.get(0)).cmp(&format!("{}", b.get(0))));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get(0), &Value::Varchar("A".into()));
    assert_eq!(results[0].get(1), &Value::Integer(2));
    assert_eq!(results[1].get(0), &Value::Varchar("B".into()));
    assert_eq!(results[1].get(1), &Value::Integer(1));
}

#[test]
fn aggregation_over_empty_table_with_no_group_by_emits_one_row() {
    let (ctx, catalog) = test_context();
    catalog.create_table("empty", Schema::new(vec![Column::new("id", DataType::Integer)]));

    let scan = Box::new(SeqScanExecutor::new(ctx, "empty".into(), None));
    let mut agg = AggregationExecutor::new(
        vec![],
        vec![(AggregateType::CountStar, Expression::constant(Value::Null)), (AggregateType::Sum, Expression::column(0, DataType::Integer))],
        scan,
    );
    let results = drain(&mut agg);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get(0), &Value::Integer(0)); // COUNT(*) = 0
    assert_eq!(results[0].get(1), &Value::Null); // SUM over no rows stays NULL
}

#[test]
fn aggregation_with_group_by_and_no_rows_emits_nothing() {
    let (ctx, catalog) = test_context();
    catalog.create_table("empty", Schema::new(vec![Column::new("id", DataType::Integer)]));

    let scan = Box::new(SeqScanExecutor::new(ctx, "empty".into(), None));
    let mut agg = AggregationExecutor::new(
        vec![Expression::column(0, DataType::Integer)],
        vec![(AggregateType::CountStar, Expression::constant(Value::Null))],
        scan,
    );
    assert!(drain(&mut agg).is_empty());
}

#[test]
fn topn_orders_ascending_and_caps_at_limit() {
    let (ctx, catalog) = test_context();
    catalog.create_table("people", Schema::new(vec![Column::new("age", DataType::Integer)]));
    let rows = vec![30, 10, 50, 20, 40, 60, 5].into_iter().map(|a| Tuple::new(vec![Value::Integer(a)])).collect();
    { let mut e = InsertExecutor::new(ctx.clone(), "people".into(), Box::new(LiteralExecutor::new(rows))); e.init(); e.next(); }

    let scan = Box::new(SeqScanExecutor::new(ctx, "people".into(), None));
    let mut topn = TopNExecutor::new(
        5,
        vec![(Expression::column(0, DataType::Integer), OrderDirection::Asc)],
        scan,
    );
    let results = drain(&mut topn);
    let ages: Vec<i32> = results
        .iter()
        .map(|t| match t.get(0) {
            Value::Integer(v) => *v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(ages, vec![5, 10, 20, 30, 40]);
}
