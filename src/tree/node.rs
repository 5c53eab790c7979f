//! A single folder in the tree.

use crate::namemap::NameMap;
use crate::sync::NodeSync;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

fn next_debug_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// One folder in the tree: its children, a weak back-reference to its
/// parent, and the synchronizer guarding its children map.
///
/// `children` and `parent` are wrapped in a plain [`parking_lot::Mutex`]
/// rather than left as bare [`std::cell::Cell`]-style interior mutability.
/// That inner mutex is never the thing providing this crate's concurrency
/// guarantees — [`NodeSync`] is — it exists purely so the compiler accepts
/// mutation through a shared `&Node` from whichever thread currently holds
/// the corresponding `NodeSync` protection. Under the locking protocol in
/// [`crate::tree`], it is always uncontended: only one thread at a time ever
/// holds writer protection on the node whose `children` it mutates, and a
/// node's `parent` is only ever rewritten while the writer protection of
/// the subtree's lowest common ancestor is held, which by construction
/// excludes every other traversal from reaching this node at all.
#[derive(Debug)]
pub struct Node {
    id: u64,
    pub(crate) sync: NodeSync,
    children: Mutex<NameMap>,
    parent: Mutex<Option<Weak<Node>>>,
}

impl Node {
    /// Creates the root of a fresh tree: no parent, no children.
    pub(crate) fn new_root() -> Arc<Node> {
        Arc::new(Node {
            id: next_debug_id(),
            sync: NodeSync::new(),
            children: Mutex::new(NameMap::new()),
            parent: Mutex::new(None),
        })
    }

    /// Creates a fresh, empty node whose parent back-reference is set to
    /// `parent`. The node is not yet reachable from `parent`'s children map
    /// — the caller inserts it under writer protection immediately after.
    pub(crate) fn new_child(parent: &Arc<Node>) -> Arc<Node> {
        Arc::new(Node {
            id: next_debug_id(),
            sync: NodeSync::new(),
            children: Mutex::new(NameMap::new()),
            parent: Mutex::new(Some(Arc::downgrade(parent))),
        })
    }

    /// Creates a node with no parent, detached from any tree. Only used by
    /// unit tests exercising [`NameMap`] or [`NodeSync`] in isolation.
    #[cfg(test)]
    pub(crate) fn new_orphan() -> Arc<Node> {
        Arc::new(Node {
            id: next_debug_id(),
            sync: NodeSync::new(),
            children: Mutex::new(NameMap::new()),
            parent: Mutex::new(None),
        })
    }

    /// Debug-only identifier, assigned at construction. Has no bearing on
    /// tree semantics; used only in log lines and `Debug` output.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Locks and returns this node's children map.
    ///
    /// Callers are expected to already hold the appropriate reader or
    /// writer protection from `self.sync` before calling this — that
    /// protocol, not this lock, is what this crate's concurrency
    /// guarantees rest on.
    pub(crate) fn children(&self) -> MutexGuard<'_, NameMap> {
        self.children.lock()
    }

    /// Resolves the live parent node, if any (absent for the root, or if
    /// the parent has since been dropped — which cannot happen while any
    /// reader chain through this node is held, see [`crate::tree`]).
    pub(crate) fn parent(&self) -> Option<Arc<Node>> {
        self.parent.lock().as_ref().and_then(Weak::upgrade)
    }

    /// Rewrites the parent back-reference. Called on the moved subtree's
    /// root as part of `move`'s atomic transplant, under the writer
    /// protection of the operation's lowest common ancestor.
    pub(crate) fn set_parent(&self, new_parent: &Arc<Node>) {
        *self.parent.lock() = Some(Arc::downgrade(new_parent));
    }
}
