//! The concurrent folder tree and its four operations.
//!
//! Every operation acquires protection hand-over-hand, one node at a time,
//! from the root down — never a single lock over the whole tree. `list`
//! descends with readers the whole way. `create` and `remove` descend with
//! readers to the target's parent and take a writer there for the final
//! mutation. `move` is the odd one out: it locates the lowest common
//! ancestor of its two paths, takes a writer there, and performs the rest of
//! the transplant underneath that single writer with no further per-node
//! locking, since nothing else can reach into that subtree while it holds.

mod node;

pub use node::Node;

use crate::error::{TreeError, TreeResult};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::path;

/// A handle to a folder tree, rooted at an always-present `"/"`.
///
/// Cloning a `Tree` is cheap and shares the same underlying tree — every
/// operation takes `&self`, so a `Tree` is typically wrapped in an `Arc` (or
/// simply cloned, since it is itself just a thin handle around one) and
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Tree {
    root: Arc<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a new, empty tree containing only the root folder `"/"`.
    pub fn new() -> Self {
        Tree {
            root: Node::new_root(),
        }
    }

    /// Lists the direct children of `path` as a lexicographically sorted,
    /// comma-separated string (empty if `path` has no children).
    pub fn list(&self, path: &str) -> TreeResult<String> {
        trace!("list {path}");
        let result = self.list_inner(path);
        debug!("list {path} -> {result:?}");
        result
    }

    fn list_inner(&self, path: &str) -> TreeResult<String> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidPath);
        }
        let target = descend_readers(&self.root, path).ok_or(TreeError::NotFound)?;
        target.sync.reader_enter();
        let rendered = target.children().render_sorted();
        target.sync.reader_leave();
        release_reader_chain(&target);
        Ok(rendered)
    }

    /// Creates a new, empty folder at `path`. Fails if `path`'s parent does
    /// not exist, or if a folder already exists at `path` (this includes
    /// `path` being the root).
    pub fn create(&self, path: &str) -> TreeResult<()> {
        trace!("create {path}");
        let result = self.create_inner(path);
        debug!("create {path} -> {result:?}");
        result
    }

    fn create_inner(&self, path: &str) -> TreeResult<()> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(path) {
            return Err(TreeError::Exists);
        }
        let (parent_path, name) = path::parent_of(path).expect("non-root path has a parent");
        let parent = descend_readers(&self.root, &parent_path).ok_or(TreeError::NotFound)?;

        let blocked = enter_writer_logged(&parent);
        let fresh = Node::new_child(&parent);
        let inserted = parent.children().insert(name, fresh);
        parent.sync.writer_leave();
        if blocked {
            warn!("create {path} blocked on a contended writer");
        }

        release_reader_chain(&parent);
        if inserted {
            Ok(())
        } else {
            Err(TreeError::Exists)
        }
    }

    /// Removes the empty folder at `path`. Fails if `path` does not exist,
    /// still has children, or is the root.
    pub fn remove(&self, path: &str) -> TreeResult<()> {
        trace!("remove {path}");
        let result = self.remove_inner(path);
        debug!("remove {path} -> {result:?}");
        result
    }

    fn remove_inner(&self, path: &str) -> TreeResult<()> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(path) {
            return Err(TreeError::Busy);
        }
        let (parent_path, name) = path::parent_of(path).expect("non-root path has a parent");
        let parent = descend_readers(&self.root, &parent_path).ok_or(TreeError::NotFound)?;

        let blocked = enter_writer_logged(&parent);
        let mut children = parent.children();
        let result = match children.get(&name) {
            None => Err(TreeError::NotFound),
            Some(child) => {
                if child.children().is_empty() {
                    Ok(())
                } else {
                    Err(TreeError::NotEmpty)
                }
            }
        };
        if result.is_ok() {
            children.remove(&name);
        }
        drop(children);
        parent.sync.writer_leave();
        if blocked {
            warn!("remove {path} blocked on a contended writer");
        }

        release_reader_chain(&parent);
        result
    }

    /// Moves the folder at `source` to `target`, which becomes its new full
    /// path. Fails if `source` does not exist, `target`'s parent does not
    /// exist, a folder already exists at `target`, `source` is the root, or
    /// `target` denotes the root or a location inside `source`'s own
    /// subtree. Moving `source` onto itself is a no-op.
    pub fn rename(&self, source: &str, target: &str) -> TreeResult<()> {
        trace!("rename {source} -> {target}");
        let result = self.rename_inner(source, target);
        debug!("rename {source} -> {target} = {result:?}");
        result
    }

    fn rename_inner(&self, source: &str, target: &str) -> TreeResult<()> {
        if !path::is_valid(source) || !path::is_valid(target) {
            return Err(TreeError::InvalidPath);
        }
        if path::is_root(source) {
            return Err(TreeError::Busy);
        }
        if path::is_root(target) {
            return Err(TreeError::Exists);
        }
        if path::has_prefix(target, source) && !path::equal(target, source) {
            return Err(TreeError::IntoOwnSubtree);
        }

        // Lock one level above the raw common prefix of source and target,
        // not the common prefix itself: the common prefix can coincide
        // exactly with source or target's own full path (e.g. moving "/a/b/"
        // onto "/a/"), in which case that path's parent is the lowest point
        // still guaranteed to be an ancestor-or-equal of both source's and
        // target's parent. Locking here is what makes it safe to walk the
        // rest of the way down to both parents with no further per-node
        // synchronization.
        let common = path::common_prefix(source, target);
        let lock_path = if path::is_root(&common) {
            common
        } else {
            path::parent_of(&common).expect("non-root path has a parent").0
        };

        let lock_node = descend_readers(&self.root, &lock_path).ok_or(TreeError::NotFound)?;
        let blocked = enter_writer_logged(&lock_node);

        let result = rename_under_lock(&lock_node, &lock_path, source, target);

        lock_node.sync.writer_leave();
        if blocked {
            warn!("rename {source} -> {target} blocked on a contended writer");
        }
        release_reader_chain(&lock_node);
        result
    }
}

/// Descends from `root` along every component of `path`, taking reader
/// protection on each node just before moving into its child. Returns the
/// node denoted by `path`, with reader protection held on every strict
/// ancestor of it (released by the caller via [`release_reader_chain`]).
/// Returns `None`, having released whatever it had already taken, if a
/// component along the way is missing.
fn descend_readers(root: &Arc<Node>, path: &str) -> Option<Arc<Node>> {
    let mut cur = Arc::clone(root);
    let mut rest = path;
    while let Some((component, remainder)) = path::split_first(rest) {
        cur.sync.reader_enter();
        let next = cur.children().get(component).cloned();
        match next {
            Some(child) => {
                cur = child;
                rest = remainder;
            }
            None => {
                cur.sync.reader_leave();
                release_reader_chain(&cur);
                return None;
            }
        }
    }
    Some(cur)
}

/// Releases reader protection on every strict ancestor of `node`, walking up
/// via parent back-references to the root. `node`'s own protection, if any,
/// must already have been released by the caller.
fn release_reader_chain(node: &Arc<Node>) {
    let mut cur = node.parent();
    while let Some(n) = cur {
        n.sync.reader_leave();
        cur = n.parent();
    }
}

/// Calls `writer_enter`, reporting whether it had to actually wait (rather
/// than being granted immediately), so the caller can log a `warn!` the one
/// time a writer actually blocks.
fn enter_writer_logged(node: &Arc<Node>) -> bool {
    let start = Instant::now();
    node.sync.writer_enter();
    // A few microseconds of scheduling noise do not count as "blocked" —
    // only a wait long enough that it was almost certainly queued behind
    // another holder.
    start.elapsed() > std::time::Duration::from_millis(1)
}

/// Walks from `start` down through the unlocked `path`, via plain name-map
/// lookups with no reader/writer protection of its own. Safe only while the
/// caller holds writer protection on an ancestor that no other operation can
/// get past — see [`Tree::rename_inner`].
fn find_unlocked(start: &Arc<Node>, path: &str) -> Option<Arc<Node>> {
    let mut cur = Arc::clone(start);
    let mut rest = path;
    while let Some((component, remainder)) = path::split_first(rest) {
        let next = cur.children().get(component).cloned();
        cur = next?;
        rest = remainder;
    }
    Some(cur)
}

/// Returns `full` with its `prefix` stripped, re-expressed as a path rooted
/// at whatever node `prefix` denotes. `prefix` must be a component-aligned
/// prefix of `full` (guaranteed by construction wherever this is called).
fn relative_to<'a>(prefix: &str, full: &'a str) -> &'a str {
    &full[prefix.len() - 1..]
}

/// Performs the actual transplant once `lock_node` (denoted by `lock_path`)
/// holds writer protection covering both `source` and `target`.
fn rename_under_lock(
    lock_node: &Arc<Node>,
    lock_path: &str,
    source: &str,
    target: &str,
) -> TreeResult<()> {
    let source_rel = relative_to(lock_path, source);
    let (source_parent_rel, source_name) =
        path::parent_of(source_rel).expect("source lies under lock_node");
    let source_parent =
        find_unlocked(lock_node, &source_parent_rel).ok_or(TreeError::NotFound)?;

    let moved = source_parent
        .children()
        .get(&source_name)
        .cloned()
        .ok_or(TreeError::NotFound)?;

    if path::equal(source, target) {
        return Ok(());
    }

    let target_rel = relative_to(lock_path, target);
    let (target_parent_rel, target_name) =
        path::parent_of(target_rel).expect("target lies under lock_node");
    let target_parent =
        find_unlocked(lock_node, &target_parent_rel).ok_or(TreeError::NotFound)?;

    if target_parent.children().get(&target_name).is_some() {
        return Err(TreeError::Exists);
    }

    source_parent.children().remove(&source_name);
    moved.set_parent(&target_parent);
    let inserted = target_parent.children().insert(target_name, moved);
    debug_assert!(
        inserted,
        "target name availability was just checked under the same writer protection"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_list_then_remove() {
        let tree = Tree::new();
        assert_eq!(tree.list("/").unwrap(), "");
        tree.create("/a/").unwrap();
        tree.create("/b/").unwrap();
        assert_eq!(tree.list("/").unwrap(), "a,b");
        tree.create("/a/c/").unwrap();
        assert_eq!(tree.list("/a/").unwrap(), "c");

        assert_eq!(tree.remove("/a/").unwrap_err(), TreeError::NotEmpty);
        tree.remove("/a/c/").unwrap();
        tree.remove("/a/").unwrap();
        assert_eq!(tree.list("/").unwrap(), "b");
    }

    #[test]
    fn create_rejects_duplicates_and_missing_parents() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(tree.create("/a/").unwrap_err(), TreeError::Exists);
        assert_eq!(tree.create("/").unwrap_err(), TreeError::Exists);
        assert_eq!(tree.create("/missing/x/").unwrap_err(), TreeError::NotFound);
        assert_eq!(tree.create("/BAD/").unwrap_err(), TreeError::InvalidPath);
    }

    #[test]
    fn remove_rejects_root_and_missing_and_nonempty() {
        let tree = Tree::new();
        assert_eq!(tree.remove("/").unwrap_err(), TreeError::Busy);
        assert_eq!(tree.remove("/missing/").unwrap_err(), TreeError::NotFound);
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        assert_eq!(tree.remove("/a/").unwrap_err(), TreeError::NotEmpty);
    }

    #[test]
    fn list_missing_path_is_not_found() {
        let tree = Tree::new();
        assert_eq!(tree.list("/missing/").unwrap_err(), TreeError::NotFound);
    }

    #[test]
    fn rename_across_siblings_under_root() {
        let tree = Tree::new();
        tree.create("/x/").unwrap();
        tree.create("/y/").unwrap();
        tree.create("/x/c/").unwrap();
        tree.rename("/x/c/", "/y/c/").unwrap();
        assert_eq!(tree.list("/x/").unwrap(), "");
        assert_eq!(tree.list("/y/").unwrap(), "c");
    }

    #[test]
    fn rename_deep_within_a_shared_ancestor() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        tree.create("/a/b/x/").unwrap();
        tree.create("/a/b/y/").unwrap();
        tree.rename("/a/b/x/", "/a/b/y/x/").unwrap();
        assert_eq!(tree.list("/a/b/").unwrap(), "y");
        assert_eq!(tree.list("/a/b/y/").unwrap(), "x");
    }

    #[test]
    fn rename_onto_an_ancestor_conflicts_with_its_own_name() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        assert_eq!(tree.rename("/a/b/", "/a/").unwrap_err(), TreeError::Exists);
    }

    #[test]
    fn rename_rejects_into_own_subtree() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        assert_eq!(
            tree.rename("/a/", "/a/b/c/").unwrap_err(),
            TreeError::IntoOwnSubtree
        );
    }

    #[test]
    fn rename_onto_self_is_a_successful_no_op() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        tree.rename("/a/", "/a/").unwrap();
        assert_eq!(tree.list("/").unwrap(), "a");
        assert_eq!(tree.list("/a/").unwrap(), "b");
    }

    #[test]
    fn rename_rejects_root_source_and_target() {
        let tree = Tree::new();
        assert_eq!(tree.rename("/", "/a/").unwrap_err(), TreeError::Busy);
        tree.create("/a/").unwrap();
        assert_eq!(tree.rename("/a/", "/").unwrap_err(), TreeError::Exists);
    }

    #[test]
    fn rename_missing_source_or_target_parent_is_not_found() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(
            tree.rename("/missing/", "/a/b/").unwrap_err(),
            TreeError::NotFound
        );
        assert_eq!(
            tree.rename("/a/", "/missing/b/").unwrap_err(),
            TreeError::NotFound
        );
    }
}
