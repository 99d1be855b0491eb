use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node in the copy-on-write trie. Immutable once published: every write
/// operation clones exactly the nodes on the path from the root to the
/// modified key, leaving every other subtree shared by reference with the
/// trie it was cloned from (section 4.4's "clone nodes on the write path
/// only").
#[derive(Clone)]
struct TrieNode {
    children: BTreeMap<u8, Arc<TrieNode>>,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

impl TrieNode {
    fn empty() -> Self {
        Self {
            children: BTreeMap::new(),
            value: None,
        }
    }

    fn is_value(&self) -> bool {
        self.value.is_some()
    }
}

/// An immutable, persistent, byte-keyed trie. Cloning a `Trie` is O(1) — it
/// just bumps the root's reference count — which is how structural sharing
/// across versions is expressed in Rust: every `Trie` handle is a root
/// pointer, and `put`/`remove` return a brand new handle rather than
/// mutating `self`.
#[derive(Clone, Default)]
pub struct Trie {
    root: Option<Arc<TrieNode>>,
}

impl Trie {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Looks up `key`, returning a borrowed reference to its value if
    /// present and stored as exactly type `T`. A present value of a
    /// different type is treated as absent (`TypeMismatch` in section 7's
    /// taxonomy — surfaced here as `None` rather than an error, matching
    /// the contract in section 4.4).
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        let mut node = self.root.as_deref()?;
        for byte in key.bytes() {
            node = node.children.get(&byte)?.as_ref();
        }
        node.value.as_ref()?.downcast_ref::<T>()
    }

    /// Returns a new trie with `key` mapped to `value`, sharing every
    /// subtree not on the path to `key` with `self`. An empty key makes
    /// the root itself a value node.
    pub fn put<T: Send + Sync + 'static>(&self, key: &str, value: T) -> Trie {
        let boxed: Arc<dyn Any + Send + Sync> = Arc::new(value);
        let new_root = Self::put_rec(self.root.as_deref(), key.as_bytes(), boxed);
        Trie {
            root: Some(Arc::new(new_root)),
        }
    }

    fn put_rec(node: Option<&TrieNode>, key: &[u8], value: Arc<dyn Any + Send + Sync>) -> TrieNode {
        match key.split_first() {
            None => {
                let mut new_node = node.cloned().unwrap_or_else(TrieNode::empty);
                new_node.value = Some(value);
                new_node
            }
            Some((&byte, rest)) => {
                let mut new_node = node.cloned().unwrap_or_else(TrieNode::empty);
                let child = new_node.children.get(&byte).map(|c| c.as_ref());
                let new_child = Self::put_rec(child, rest, value);
                new_node.children.insert(byte, Arc::new(new_child));
                new_node
            }
        }
    }

    /// Returns a new trie with `key` removed. Demotes the terminal node to
    /// a non-value node and prunes every ancestor that ends up with
    /// neither children nor a value, per section 4.4. Absent keys return
    /// the trie unchanged (structurally sharing the entire original root).
    pub fn remove(&self, key: &str) -> Trie {
        match &self.root {
            None => self.clone(),
            Some(root) => match Self::remove_rec(root, key.as_bytes()) {
                Some(new_root) => Trie {
                    root: Some(Arc::new(new_root)),
                },
                None => Trie { root: None },
            },
        }
    }

    /// Returns `Some(new_node)` if the subtree rooted here should still
    /// exist after removal, `None` if it should be pruned entirely.
    fn remove_rec(node: &TrieNode, key: &[u8]) -> Option<TrieNode> {
        match key.split_first() {
            None => {
                if !node.is_value() {
                    return Some(node.clone());
                }
                let mut new_node = node.clone();
                new_node.value = None;
                if new_node.children.is_empty() {
                    None
                } else {
                    Some(new_node)
                }
            }
            Some((&byte, rest)) => {
                let Some(child) = node.children.get(&byte) else {
                    return Some(node.clone());
                };
                let mut new_node = node.clone();
                match Self::remove_rec(child, rest) {
                    Some(new_child) => {
                        new_node.children.insert(byte, Arc::new(new_child));
                    }
                    None => {
                        new_node.children.remove(&byte);
                    }
                }
                if new_node.children.is_empty() && !new_node.is_value() {
                    None
                } else {
                    Some(new_node)
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}
