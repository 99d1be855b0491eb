//! An in-memory stand-in for the real table heap consumed by the
//! executors (section 6, "TableHeap (consumed)"). The CORE's executors
//! only ever reach the table heap through `make_iterator`/`get_tuple`/
//! `insert_tuple`/`update_tuple_meta`; this gives them something real to
//! drive without pulling in the page-formatted slotted-page heap the
//! out-of-scope storage-engine layer owns.

use std::sync::Mutex;

use crate::common::rid::Rid;
use crate::types::tuple::{Tuple, TupleMeta};

/// Append-only row store keyed by slot number (the table heap's `Rid` is
/// always `(0, slot)` — there's only ever one "page" here). Rows are never
/// physically removed; deletion is the `TupleMeta::is_deleted` flag an
/// executor sets via [`TableHeap::update_tuple_meta`].
pub struct TableHeap {
    rows: Mutex<Vec<(TupleMeta, Tuple)>>,
}

impl Default for TableHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl TableHeap {
    pub fn new() -> Self {
        Self { rows: Mutex::new(Vec::new()) }
    }

    /// Snapshots the record identifiers of every row currently in the
    /// heap, in insertion order. Executors that mutate the heap while
    /// scanning (delete, update) snapshot via this method up front so a
    /// self-referential write can't revisit rows it just inserted
    /// (section 9's Open Question, option (a)).
    pub fn make_iterator(&self) -> Vec<Rid> {
        let rows = self.rows.lock().unwrap();
        (0..rows.len() as u32).map(|slot| Rid::new(0, slot)).collect()
    }

    pub fn get_tuple(&self, rid: Rid) -> Option<(TupleMeta, Tuple)> {
        self.rows.lock().unwrap().get(rid.slot_num() as usize).cloned()
    }

    pub fn insert_tuple(&self, meta: TupleMeta, tuple: Tuple) -> Option<Rid> {
        let mut rows = self.rows.lock().unwrap();
        let slot = rows.len() as u32;
        rows.push((meta, tuple));
        Some(Rid::new(0, slot))
    }

    pub fn update_tuple_meta(&self, meta: TupleMeta, rid: Rid) {
        if let Some(entry) = self.rows.lock().unwrap().get_mut(rid.slot_num() as usize) {
            entry.0 = meta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Value;

    #[test]
    fn insert_then_get_round_trips() {
        let heap = TableHeap::new();
        let rid = heap.insert_tuple(TupleMeta::new(1), Tuple::new(vec![Value::Integer(7)])).unwrap();
        let (meta, tuple) = heap.get_tuple(rid).unwrap();
        assert!(!meta.is_deleted);
        assert_eq!(tuple.get(0), &Value::Integer(7));
    }

    #[test]
    fn update_tuple_meta_marks_deleted() {
        let heap = TableHeap::new();
        let rid = heap.insert_tuple(TupleMeta::new(1), Tuple::new(vec![Value::Integer(1)])).unwrap();
        heap.update_tuple_meta(TupleMeta::deleted(1), rid);
        assert!(heap.get_tuple(rid).unwrap().0.is_deleted);
    }

    #[test]
    fn make_iterator_snapshots_at_call_time() {
        let heap = TableHeap::new();
        heap.insert_tuple(TupleMeta::new(1), Tuple::new(vec![Value::Integer(1)]));
        let snapshot = heap.make_iterator();
        heap.insert_tuple(TupleMeta::new(1), Tuple::new(vec![Value::Integer(2)]));
        assert_eq!(snapshot.len(), 1);
    }
}
