//! The catalog ties a table's heap, schema, and indexes together under a
//! name (section 6). It owns no storage of its own beyond that
//! bookkeeping — the heap and hash index do the real work.

pub mod index;
pub mod table_heap;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use self::index::{HashIndex, Index, IndexInfo};
use self::table_heap::TableHeap;
use crate::buffer::BufferPoolManager;
use crate::common::config::{BUCKET_MAX_SIZE, DIRECTORY_MAX_DEPTH, HEADER_MAX_DEPTH};
use crate::storage::index::DiskExtendibleHashTable;
use crate::types::schema::Schema;

pub struct TableInfo {
    pub name: String,
    pub oid: u32,
    pub schema: Schema,
    pub table: Arc<TableHeap>,
}

/// Name-and-oid indexed registry of tables and their indexes. A table is
/// created once and never dropped; this mirrors the teaching scope of
/// section 1 (no DDL beyond create).
pub struct Catalog {
    bpm: Arc<BufferPoolManager>,
    tables: Mutex<HashMap<String, Arc<TableInfo>>>,
    table_oids: Mutex<HashMap<u32, String>>,
    indexes: Mutex<HashMap<String, Arc<IndexInfo>>>,
    table_indexes: Mutex<HashMap<String, Vec<Arc<IndexInfo>>>>,
    next_table_oid: Mutex<u32>,
    next_index_oid: Mutex<u32>,
}

impl Catalog {
    pub fn new(bpm: Arc<BufferPoolManager>) -> Self {
        Self {
            bpm,
            tables: Mutex::new(HashMap::new()),
            table_oids: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
            table_indexes: Mutex::new(HashMap::new()),
            next_table_oid: Mutex::new(0),
            next_index_oid: Mutex::new(0),
        }
    }

    pub fn create_table(&self, name: &str, schema: Schema) -> Arc<TableInfo> {
        let mut oid_guard = self.next_table_oid.lock().unwrap();
        let oid = *oid_guard;
        *oid_guard += 1;
        drop(oid_guard);

        let info = Arc::new(TableInfo {
            name: name.to_string(),
            oid,
            schema,
            table: Arc::new(TableHeap::new()),
        });
        self.tables.lock().unwrap().insert(name.to_string(), info.clone());
        self.table_oids.lock().unwrap().insert(oid, name.to_string());
        debug!(table = name, oid, "catalog: created table");
        info
    }

    pub fn get_table_by_name(&self, name: &str) -> Option<Arc<TableInfo>> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    pub fn get_table_by_oid(&self, oid: u32) -> Option<Arc<TableInfo>> {
        let name = self.table_oids.lock().unwrap().get(&oid).cloned()?;
        self.get_table_by_name(&name)
    }

    /// Creates a hash index over `key_attrs` of `table_name`'s schema.
    /// Panics if the table doesn't exist, matching the teacher's
    /// catalog's fail-fast stance on referencing an unknown table.
    pub fn create_index(&self, index_name: &str, table_name: &str, key_attrs: Vec<usize>) -> Arc<IndexInfo> {
        let mut oid_guard = self.next_index_oid.lock().unwrap();
        let oid = *oid_guard;
        *oid_guard += 1;
        drop(oid_guard);

        let table = DiskExtendibleHashTable::new(self.bpm.clone(), HEADER_MAX_DEPTH, DIRECTORY_MAX_DEPTH, BUCKET_MAX_SIZE);
        let index: Arc<dyn Index> = Arc::new(HashIndex::new(table));
        let info = Arc::new(IndexInfo {
            name: index_name.to_string(),
            oid,
            table_name: table_name.to_string(),
            key_attrs,
            index,
        });

        self.indexes.lock().unwrap().insert(index_name.to_string(), info.clone());
        self.table_indexes
            .lock()
            .unwrap()
            .entry(table_name.to_string())
            .or_default()
            .push(info.clone());
        debug!(index = index_name, table = table_name, oid, "catalog: created index");
        info
    }

    pub fn get_table_indexes(&self, table_name: &str) -> Vec<Arc<IndexInfo>> {
        self.table_indexes.lock().unwrap().get(table_name).cloned().unwrap_or_default()
    }

    pub fn get_index_by_name(&self, name: &str) -> Option<Arc<IndexInfo>> {
        self.indexes.lock().unwrap().get(name).cloned()
    }
}
