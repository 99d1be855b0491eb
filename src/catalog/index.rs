//! The `Index` trait the executors consume (section 6, "Index
//! (consumed)") and the one concrete implementation backing it: a disk
//! extendible hash table keyed on a single `i32` column extracted out of
//! the indexed tuple.

use std::sync::Arc;

use crate::common::rid::Rid;
use crate::storage::index::DiskExtendibleHashTable;
use crate::types::tuple::Tuple;
use crate::types::value::Value;

/// A secondary structure mapping a tuple's indexed column(s) to its
/// record identifier. `HashIndex` is the only implementation in scope;
/// the trait exists so executors depend on behavior, not on the
/// extendible hash table specifically.
pub trait Index: Send + Sync {
    fn insert_entry(&self, key: &Tuple, rid: Rid) -> bool;
    fn delete_entry(&self, key: &Tuple) -> bool;
    fn scan_key(&self, key: &Tuple) -> Option<Rid>;
}

/// Wraps a [`DiskExtendibleHashTable`], extracting its `i32` key out of
/// column 0 of whatever key tuple the caller built via
/// [`super::IndexInfo::extract_key`].
pub struct HashIndex {
    table: DiskExtendibleHashTable,
}

impl HashIndex {
    pub fn new(table: DiskExtendibleHashTable) -> Self {
        Self { table }
    }

    fn key_of(key: &Tuple) -> i32 {
        match key.get(0) {
            Value::Integer(v) => *v,
            Value::TinyInt(v) => *v as i32,
            Value::SmallInt(v) => *v as i32,
            other => panic!("hash index only supports integer keys, got {other:?}"),
        }
    }
}

impl Index for HashIndex {
    fn insert_entry(&self, key: &Tuple, rid: Rid) -> bool {
        self.table.insert(Self::key_of(key), rid)
    }

    fn delete_entry(&self, key: &Tuple) -> bool {
        self.table.remove(Self::key_of(key))
    }

    fn scan_key(&self, key: &Tuple) -> Option<Rid> {
        self.table.get(Self::key_of(key))
    }
}

/// Catalog-level bookkeeping for one index: its key schema (a projection
/// of the indexed table's schema) plus which of the table's columns feed
/// that projection.
pub struct IndexInfo {
    pub name: String,
    pub oid: u32,
    pub table_name: String,
    pub key_attrs: Vec<usize>,
    pub index: Arc<dyn Index>,
}

impl IndexInfo {
    /// Projects a full table row down to the key tuple this index scans
    /// on, per `key_attrs`.
    pub fn extract_key(&self, tuple: &Tuple) -> Tuple {
        Tuple::new(self.key_attrs.iter().map(|&i| tuple.get(i).clone()).collect())
    }
}
