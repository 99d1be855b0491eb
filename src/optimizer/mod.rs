//! The three algebraic rewrite rules of section 4.8, each a post-order
//! pass over a [`PlanNode`] tree. None of these do cost-based reasoning —
//! a Non-goal this crate keeps — they fire unconditionally whenever their
//! syntactic shape matches, same as the teacher's own rule-based
//! optimizer passes.

use crate::catalog::Catalog;
use crate::execution::plan::PlanNode;
use crate::expression::{Expression, TupleSide};

/// Applies every rewrite rule bottom-up: children are optimized first, so
/// a rule firing on a node always sees already-rewritten children (e.g.
/// `Sort+Limit->TopN` composes under a join that itself got rewritten to
/// a `HashJoin`).
pub fn optimize(plan: PlanNode, catalog: &Catalog) -> PlanNode {
    let plan = match plan {
        PlanNode::Insert { table_name, child } => PlanNode::Insert {
            table_name,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Delete { table_name, child } => PlanNode::Delete {
            table_name,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Update { table_name, assignments, child } => PlanNode::Update {
            table_name,
            assignments,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Projection { expressions, child } => PlanNode::Projection {
            expressions,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Sort { order_by, child } => PlanNode::Sort {
            order_by,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Limit { limit, child } => PlanNode::Limit {
            limit,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::TopN { limit, order_by, child } => PlanNode::TopN {
            limit,
            order_by,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::Aggregation { group_by, aggregates, child } => PlanNode::Aggregation {
            group_by,
            aggregates,
            child: Box::new(optimize(*child, catalog)),
        },
        PlanNode::NestedLoopJoin { predicate, left, right } => PlanNode::NestedLoopJoin {
            predicate,
            left: Box::new(optimize(*left, catalog)),
            right: Box::new(optimize(*right, catalog)),
        },
        other => other, // SeqScan, HashJoin, IndexScan: leaves w.r.t. this recursion
    };

    let plan = rewrite_sort_limit_to_topn(plan);
    let plan = rewrite_nlj_to_hashjoin(plan);
    rewrite_seqscan_to_indexscan(plan, catalog)
}

/// `Limit(N){ Sort(order_by){ child } } -> TopN(N, order_by){ child }`.
/// Only fires when the `Sort` is the `Limit`'s *sole* child, per section
/// 4.8.
fn rewrite_sort_limit_to_topn(plan: PlanNode) -> PlanNode {
    match plan {
        PlanNode::Limit { limit, child } => match *child {
            PlanNode::Sort { order_by, child: grandchild } => PlanNode::TopN {
                limit,
                order_by,
                child: grandchild,
            },
            other => PlanNode::Limit { limit, child: Box::new(other) },
        },
        other => other,
    }
}

/// A nested-loop join whose predicate is a conjunction of column-equality
/// comparisons becomes a `HashJoin`, partitioning each comparison's
/// operands by which side of the join they reference (section 4.8).
fn rewrite_nlj_to_hashjoin(plan: PlanNode) -> PlanNode {
    let PlanNode::NestedLoopJoin { predicate, left, right } = plan else {
        return plan;
    };
    let Some(pairs) = predicate.flatten_equi_conjunction() else {
        return PlanNode::NestedLoopJoin { predicate, left, right };
    };

    let mut left_keys = Vec::with_capacity(pairs.len());
    let mut right_keys = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        match (side_of(&a), side_of(&b)) {
            (Some(TupleSide::Left), Some(TupleSide::Right)) => {
                left_keys.push(a);
                right_keys.push(b);
            }
            (Some(TupleSide::Right), Some(TupleSide::Left)) => {
                left_keys.push(b);
                right_keys.push(a);
            }
            // Not a clean left/right column pair (e.g. a constant or a
            // same-side comparison) -- this rule only handles equi-joins
            // across the two input sides, so bail and keep the NLJ
            // exactly as it was (the original, still-intact `predicate`,
            // not a reconstruction from just this one conjunct).
            _ => return PlanNode::NestedLoopJoin { predicate, left, right },
        }
    }

    PlanNode::HashJoin { left_keys, right_keys, left, right }
}

/// The side a column-reference expression (or a bare constant, which
/// belongs to neither side) pulls from. `None` for anything more complex
/// than a single column/constant leaf.
fn side_of(expr: &Expression) -> Option<TupleSide> {
    match expr {
        Expression::Column { side, .. } => Some(*side),
        _ => None,
    }
}

/// `SeqScan` with a single `column = constant` filter becomes an
/// `IndexScan` when an index exists whose key attributes are exactly
/// that column (section 4.8). Any other filter shape (conjunctions,
/// non-equality, no matching index) keeps the seq-scan.
fn rewrite_seqscan_to_indexscan(plan: PlanNode, catalog: &Catalog) -> PlanNode {
    let PlanNode::SeqScan { table_name, schema, filter: Some(filter) } = plan else {
        return plan;
    };
    let Some((column_index, constant)) = filter.as_column_equals_constant() else {
        return PlanNode::SeqScan { table_name, schema, filter: Some(filter) };
    };

    let matching_index = catalog
        .get_table_indexes(&table_name)
        .into_iter()
        .find(|info| info.key_attrs == [column_index]);

    match matching_index {
        Some(info) => PlanNode::IndexScan {
            table_name,
            index_name: info.name.clone(),
            key: constant,
        },
        None => PlanNode::SeqScan { table_name, schema, filter: Some(filter) },
    }
}
