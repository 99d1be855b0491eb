use std::sync::{Arc, Mutex};

use parking_lot::RwLock;

use super::trie::Trie;

/// Keeps a snapshotted trie root alive for as long as the guard is held, so
/// the borrowed value it yields remains valid even if the store publishes
/// a newer root (or the key is removed) in the meantime (section 4.5).
pub struct ValueGuard<T: 'static> {
    #[allow(dead_code)]
    root: Trie,
    value: *const T,
}

// SAFETY: `value` is a raw pointer into `root`, which this guard owns for
// its entire lifetime; `Trie`'s nodes are immutable once published, so the
// referent never moves or changes while the guard is alive.
unsafe impl<T: Send> Send for ValueGuard<T> {}
unsafe impl<T: Sync> Sync for ValueGuard<T> {}

impl<T: 'static> std::ops::Deref for ValueGuard<T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: see the comment on the struct.
        unsafe { &*self.value }
    }
}

/// A multi-reader/single-writer façade over [`Trie`] (section 4.5).
///
/// Two disjoint critical sections make this safe without readers ever
/// blocking writers or vice versa (beyond the momentary root swap):
/// a short `root` lock guards only the act of reading or swapping the
/// current root pointer, while a long-held `write_lock` mutex serializes
/// writers against each other so a reader never observes a root mid-write
/// (it can't — writes only ever *publish* a fully-built new trie).
pub struct TrieStore {
    root: RwLock<Trie>,
    write_lock: Mutex<()>,
}

impl Default for TrieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieStore {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Trie::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshots the current root under the short root section, then looks
    /// up `key` outside of it. On a hit, returns a guard keeping that
    /// snapshot (and therefore the value) alive indefinitely.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<ValueGuard<T>> {
        let root = self.root.read().clone();
        let value_ptr = root.get::<T>(key).map(|v| v as *const T)?;
        Some(ValueGuard { root, value: value_ptr })
    }

    /// Takes the writer-exclusion lock, computes the new trie from a
    /// snapshot of the current root (outside the root lock), then
    /// publishes it under the short root lock.
    pub fn put<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        let _guard = self.write_lock.lock().unwrap();
        let snapshot = self.root.read().clone();
        let new_trie = snapshot.put(key, value);
        *self.root.write() = new_trie;
    }

    pub fn remove(&self, key: &str) {
        let _guard = self.write_lock.lock().unwrap();
        let snapshot = self.root.read().clone();
        let new_trie = snapshot.remove(key);
        *self.root.write() = new_trie;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn put_get_remove_round_trip() {
        let store = TrieStore::new();
        store.put("x", 7i32);
        assert_eq!(*store.get::<i32>("x").unwrap(), 7);
        store.remove("x");
        assert!(store.get::<i32>("x").is_none());
    }

    #[test]
    fn held_guard_survives_concurrent_remove() {
        let store = Arc::new(TrieStore::new());
        store.put("x", 7i32);

        let guard = store.get::<i32>("x").unwrap();
        assert_eq!(*guard, 7);

        let store2 = store.clone();
        thread::spawn(move || store2.remove("x")).join().unwrap();

        // the guard, already taken, still observes the old value
        assert_eq!(*guard, 7);
        // a fresh lookup observes the removal
        assert!(store.get::<i32>("x").is_none());
    }

    #[test]
    fn writers_serialize_without_lost_updates() {
        let store = Arc::new(TrieStore::new());
        let mut handles = vec![];
        for i in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                store.put(&format!("k{i}"), i);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            assert_eq!(*store.get::<i32>(&format!("k{i}")).unwrap(), i);
        }
    }
}
