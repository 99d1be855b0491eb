use std::sync::Arc;

use crate::catalog::Catalog;
use crate::common::config::TransactionId;

/// The handful of things every executor needs reaching beyond its own
/// plan node: the catalog (to resolve table/index names) and the
/// transaction id tuples are stamped with on write. There's no
/// transaction manager in scope (section 1's Non-goals exclude
/// concurrency control) — this is just the tag `TupleMeta` carries.
pub struct ExecutorContext {
    pub catalog: Arc<Catalog>,
    pub txn_id: TransactionId,
}

impl ExecutorContext {
    pub fn new(catalog: Arc<Catalog>, txn_id: TransactionId) -> Self {
        Self { catalog, txn_id }
    }
}
