//! The per-node associative container mapping a folder name to its child.
//!
//! Not thread-safe on its own — every access happens while the owning
//! node's [`crate::sync::NodeSync`] grants reader or writer protection, and
//! this type does no locking of its own.

use crate::tree::Node;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name → child-node mapping for a single folder.
///
/// Backed by a `BTreeMap` rather than a hash map so that iteration is
/// already lexicographically ordered: the "render sorted comma-separated"
/// helper `list` relies on falls out of a single pass with no secondary
/// sort.
#[derive(Debug, Default)]
pub struct NameMap {
    entries: BTreeMap<String, Arc<Node>>,
}

impl NameMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `(name, node)`. Returns `true` if the name was free and the
    /// insertion happened, `false` if the name was already taken (in which
    /// case the map is left unchanged).
    pub fn insert(&mut self, name: String, node: Arc<Node>) -> bool {
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, node);
        true
    }

    /// Looks up a child by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Node>> {
        self.entries.get(name)
    }

    /// Removes and returns a child by name, if present.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Node>> {
        self.entries.remove(name)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this folder has no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lazily iterates `(name, node)` pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Node>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Renders the child names as a lexicographically sorted,
    /// comma-separated string with no trailing comma. Empty for an empty
    /// map.
    pub fn render_sorted(&self) -> String {
        self.entries.keys().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn render_sorted_has_no_trailing_comma_and_is_ordered() {
        let mut map = NameMap::new();
        map.insert("b".into(), Node::new_orphan());
        map.insert("a".into(), Node::new_orphan());
        map.insert("c".into(), Node::new_orphan());
        assert_eq!(map.render_sorted(), "a,b,c");
    }

    #[test]
    fn render_sorted_empty_map_is_empty_string() {
        assert_eq!(NameMap::new().render_sorted(), "");
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let mut map = NameMap::new();
        assert!(map.insert("a".into(), Node::new_orphan()));
        assert!(!map.insert("a".into(), Node::new_orphan()));
        assert_eq!(map.len(), 1);
    }
}
