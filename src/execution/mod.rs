//! The Volcano-model executors (section 4.7): each exposes `init` and
//! `next`, pulled to exhaustion by its parent. Plan nodes and expressions
//! are the tagged sum types section 9 calls for ("tagged variants, not
//! open inheritance hierarchies"); executors themselves are plain
//! `Box<dyn Executor>` trees built from those plan nodes by
//! `build_executor`.

pub mod aggregation;
pub mod context;
pub mod delete;
pub mod insert;
pub mod plan;
pub mod projection;
pub mod seq_scan;
pub mod topn;
pub mod update;

use std::sync::Arc;

use crate::types::tuple::TupleRecord;

pub use context::ExecutorContext;
pub use plan::{AggregateType, OrderDirection, PlanNode};

use aggregation::AggregationExecutor;
use delete::DeleteExecutor;
use insert::InsertExecutor;
use projection::ProjectionExecutor;
use seq_scan::SeqScanExecutor;
use topn::TopNExecutor;
use update::UpdateExecutor;

/// Pull-based iterator contract every executor implements (section 4.7).
/// `next`'s `bool` return in the spec becomes `Option<TupleRecord>` here —
/// the idiomatic Rust rendering of the same "false means end-of-stream"
/// protocol.
pub trait Executor {
    fn init(&mut self);
    fn next(&mut self) -> Option<TupleRecord>;
}

/// Builds the executor tree for a plan, sharing one [`ExecutorContext`]
/// across every node.
pub fn build_executor(plan: &PlanNode, ctx: Arc<ExecutorContext>) -> Box<dyn Executor> {
    match plan {
        PlanNode::SeqScan { table_name, filter, .. } => {
            Box::new(SeqScanExecutor::new(ctx, table_name.clone(), filter.clone()))
        }
        PlanNode::Insert { table_name, child } => {
            let child_exec = build_executor(child, ctx.clone());
            Box::new(InsertExecutor::new(ctx, table_name.clone(), child_exec))
        }
        PlanNode::Delete { table_name, child } => {
            let child_exec = build_executor(child, ctx.clone());
            Box::new(DeleteExecutor::new(ctx, table_name.clone(), child_exec))
        }
        PlanNode::Update { table_name, assignments, child } => {
            let child_exec = build_executor(child, ctx.clone());
            Box::new(UpdateExecutor::new(ctx, table_name.clone(), assignments.clone(), child_exec))
        }
        PlanNode::Projection { expressions, child } => {
            let child_exec = build_executor(child, ctx);
            Box::new(ProjectionExecutor::new(expressions.clone(), child_exec))
        }
        PlanNode::TopN { limit, order_by, child } => {
            let child_exec = build_executor(child, ctx);
            Box::new(TopNExecutor::new(*limit, order_by.clone(), child_exec))
        }
        PlanNode::Aggregation { group_by, aggregates, child } => {
            let child_exec = build_executor(child, ctx);
            Box::new(AggregationExecutor::new(group_by.clone(), aggregates.clone(), child_exec))
        }
        PlanNode::Sort { .. } | PlanNode::Limit { .. } => {
            panic!("Sort/Limit must be rewritten to TopN by the optimizer before execution")
        }
        PlanNode::NestedLoopJoin { .. } | PlanNode::HashJoin { .. } | PlanNode::IndexScan { .. } => {
            panic!("join and index-scan execution are out of scope; these nodes are optimizer-rule artifacts only")
        }
    }
}
