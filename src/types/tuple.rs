use super::value::Value;
use crate::common::Rid;

/// A single row: a fixed-order vector of [`Value`]s shaped by some
/// [`super::schema::Schema`]. The executors pass tuples by value between
/// operators, matching the Volcano pull model's one-row-at-a-time
/// contract (section 4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Concatenates two tuples, used to build a join's output row or an
    /// aggregation's group-key-then-aggregates row.
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut values = self.values.clone();
        values.extend(other.values.iter().cloned());
        Tuple::new(values)
    }
}

/// Per-tuple bookkeeping the table heap tracks alongside the tuple's
/// bytes: which transaction last touched it, and whether it's been
/// logically deleted (section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleMeta {
    pub txn_id: crate::common::config::TransactionId,
    pub is_deleted: bool,
}

impl TupleMeta {
    pub fn new(txn_id: crate::common::config::TransactionId) -> Self {
        Self {
            txn_id,
            is_deleted: false,
        }
    }

    pub fn deleted(txn_id: crate::common::config::TransactionId) -> Self {
        Self {
            txn_id,
            is_deleted: true,
        }
    }
}

/// A tuple paired with the record identifier it lives at, the shape most
/// executors actually push between each other (`next(tuple_out, rid_out)`
/// in section 4.7 bundled into one value for ergonomic Rust iteration).
#[derive(Debug, Clone)]
pub struct TupleRecord {
    pub tuple: Tuple,
    pub rid: Rid,
}
