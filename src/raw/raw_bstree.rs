use core::cmp::Ordering;

use alloc::vec::Vec;
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};
use crate::allocator::NodeAllocator;
use crate::error::Result;

/// The core binary search tree backing `BSTreeMap`.
///
/// The engine knows nothing about comparators or balancing: searches take a
/// probe closure, and the map layer decides when to call its policy hooks.
pub(crate) struct RawBSTree<K, V, A> {
    /// Arena storing all tree nodes (keys and links).
    nodes: Arena<Node<K>>,
    /// Arena storing all values (separate from nodes so `IterMut` never aliases links).
    values: Arena<V>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    len: usize,
    /// Grants storage for new nodes.
    allocator: A,
}

/// Result of walking the tree with a probe.
pub(crate) enum SearchResult {
    /// A node comparing equal to the probe.
    Found(Handle),
    /// No node matched; the probe belongs on this side of this parent, or at the root when `None`.
    NotFound(Option<(Handle, Side)>),
}

/// A key-value pair removed from the tree by [`Structure::erase_node`](crate::Structure::erase_node).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removed<K, V> {
    /// The removed key.
    pub key: K,
    /// The removed value.
    pub value: V,
    /// Parent of the node that was physically unlinked, where a balancing policy
    /// would start retracing. `None` if the unlinked node was the root.
    pub parent: Option<Handle>,
}

type Stack = SmallVec<[Handle; 32]>;

impl<K, V, A> RawBSTree<K, V, A> {
    /// Creates a new, empty tree.
    pub(crate) const fn new(allocator: A) -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
            len: 0,
            allocator,
        }
    }

    /// Creates a new tree with room for `capacity` nodes before its arenas grow.
    pub(crate) fn with_capacity(capacity: usize, allocator: A) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            values: Arena::with_capacity(capacity),
            root: None,
            len: 0,
            allocator,
        }
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no elements.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of nodes the tree can hold without growing its arenas.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity().min(self.values.capacity())
    }

    pub(crate) fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Returns the root node, if any.
    #[inline]
    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns true if `handle` names a live node of this tree.
    #[inline]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains(handle)
    }

    /// Returns a reference to a node by handle.
    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    /// Returns a reference to a node by handle, or `None` if the handle is stale.
    #[inline]
    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<K>> {
        self.nodes.try_get(handle)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.nodes.get_mut(handle)
    }

    /// Returns a reference to a node by handle from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawBSTree<K, V, A>`.
    #[inline]
    pub(crate) unsafe fn node_ptr<'a>(ptr: *const Self, handle: Handle) -> &'a Node<K> {
        // SAFETY: We only access the `nodes` field, avoiding aliasing with the `values` field.
        unsafe { (*core::ptr::addr_of!((*ptr).nodes)).get(handle) }
    }

    /// Returns a mutable reference to a value by handle from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawBSTree<K, V, A>`.
    /// - The caller must have logical exclusive access to the value at `handle`.
    #[inline]
    pub(crate) unsafe fn value_mut_ptr<'a>(ptr: *mut Self, handle: Handle) -> &'a mut V {
        // SAFETY: We only access the `values` field, avoiding aliasing with the `nodes` field.
        unsafe { Arena::get_mut_ptr(core::ptr::addr_of_mut!((*ptr).values), handle) }
    }

    #[inline]
    pub(crate) fn key(&self, handle: Handle) -> &K {
        self.node(handle).key()
    }

    /// Returns the value stored at node `handle`.
    #[inline]
    pub(crate) fn value(&self, handle: Handle) -> &V {
        self.values.get(self.node(handle).value())
    }

    /// Returns the value stored at node `handle` mutably.
    #[inline]
    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        let value = self.node(handle).value();
        self.values.get_mut(value)
    }

    /// Returns the key and a mutable reference to the value stored at node `handle`.
    pub(crate) fn entry_mut(&mut self, handle: Handle) -> (&K, &mut V) {
        let node = self.nodes.get(handle);
        (node.key(), self.values.get_mut(node.value()))
    }

    #[inline]
    pub(crate) fn parent(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).parent()
    }

    #[inline]
    pub(crate) fn left(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).left()
    }

    #[inline]
    pub(crate) fn right(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).right()
    }

    /// Returns the number of parent hops from `handle` to the root.
    pub(crate) fn depth(&self, handle: Handle) -> usize {
        let mut depth = 0;
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Walks from the root, steering with `probe`, which compares the sought key
    /// against a node's key.
    pub(crate) fn search_by<F>(&self, mut probe: F) -> SearchResult
    where
        F: FnMut(&K) -> Ordering,
    {
        let Some(mut current) = self.root else {
            return SearchResult::NotFound(None);
        };

        loop {
            let node = self.node(current);
            let side = match probe(node.key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return SearchResult::Found(current),
            };
            match node.child(side) {
                Some(child) => current = child,
                None => return SearchResult::NotFound(Some((current, side))),
            }
        }
    }

    /// Returns the node with the smallest key not less than the probe.
    pub(crate) fn lower_bound_by<F>(&self, mut probe: F) -> Option<Handle>
    where
        F: FnMut(&K) -> Ordering,
    {
        let mut current = self.root;
        let mut best = None;
        while let Some(handle) = current {
            let node = self.node(handle);
            if probe(node.key()) == Ordering::Greater {
                current = node.right();
            } else {
                best = Some(handle);
                current = node.left();
            }
        }
        best
    }

    /// Returns the node with the smallest key strictly greater than the probe.
    pub(crate) fn upper_bound_by<F>(&self, mut probe: F) -> Option<Handle>
    where
        F: FnMut(&K) -> Ordering,
    {
        let mut current = self.root;
        let mut best = None;
        while let Some(handle) = current {
            let node = self.node(handle);
            if probe(node.key()) == Ordering::Less {
                best = Some(handle);
                current = node.left();
            } else {
                current = node.right();
            }
        }
        best
    }

    /// Re-points whichever link referenced `old` (a child link of `parent`, or the
    /// root when `parent` is `None`) at `new`.
    pub(crate) fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = self.node_mut(parent);
                let side = node
                    .side_of(old)
                    .expect("`RawBSTree::replace_child()` - `old` is not a child of `parent`!");
                node.set_child(side, new);
            }
        }
    }

    pub(crate) fn set_parent(&mut self, handle: Handle, parent: Option<Handle>) {
        self.node_mut(handle).set_parent(parent);
    }

    pub(crate) fn set_child(&mut self, handle: Handle, side: Side, child: Option<Handle>) {
        self.node_mut(handle).set_child(side, child);
    }

    /// Moves the tree's contents out in in-order sequence, leaving it empty.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)>
    where
        A: NodeAllocator,
    {
        let len = self.len;
        if len == 0 {
            return Vec::new();
        }

        // Collect the order first; links are gone once nodes are taken.
        let mut order = Vec::with_capacity(len);
        let mut current = self.in_order_first();
        while let Some(handle) = current {
            order.push(handle);
            current = self.in_order_next(handle);
        }

        let mut result = Vec::with_capacity(len);
        for handle in order {
            let node = self.nodes.take(handle);
            let value = self.values.take(node.value());
            result.push((node.into_key(), value));
        }

        self.allocator.deallocate(len);
        self.root = None;
        self.len = 0;
        result
    }
}

impl<K, V, A: NodeAllocator> RawBSTree<K, V, A> {
    /// Copies the tree node for node, keeping every handle valid in the copy.
    ///
    /// The copy's allocator is a clone of this one and is charged for all the
    /// nodes before anything is copied.
    pub(crate) fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        A: Clone,
    {
        let mut allocator = self.allocator.clone();
        allocator.allocate(self.len)?;
        Ok(Self {
            nodes: self.nodes.clone(),
            values: self.values.clone(),
            root: self.root,
            len: self.len,
            allocator,
        })
    }

    /// Allocates a node for `key`/`value` and links it at `slot` (the root when `None`).
    ///
    /// On failure nothing is linked and the allocator is left balanced.
    pub(crate) fn link_new(&mut self, slot: Option<(Handle, Side)>, key: K, value: V) -> Result<Handle> {
        self.allocator.allocate(1)?;

        let value = match self.values.try_alloc(value) {
            Ok(value) => value,
            Err(err) => {
                self.allocator.deallocate(1);
                return Err(err);
            }
        };

        let parent = slot.map(|(parent, _)| parent);
        let handle = match self.nodes.try_alloc(Node::new(key, value, parent)) {
            Ok(handle) => handle,
            Err(err) => {
                self.values.free(value);
                self.allocator.deallocate(1);
                return Err(err);
            }
        };

        match slot {
            None => {
                debug_assert!(self.root.is_none(), "`RawBSTree::link_new()` - root is occupied!");
                self.root = Some(handle);
            }
            Some((parent, side)) => {
                debug_assert!(self.node(parent).child(side).is_none());
                self.node_mut(parent).set_child(side, Some(handle));
            }
        }
        self.len += 1;
        Ok(handle)
    }

    /// Erases node `handle`.
    ///
    /// A node with at most one child is unlinked and its child (if any) takes its
    /// place. A node with two children receives the key and value of its in-order
    /// successor, and the successor's node is unlinked instead: `handle` stays
    /// live and now holds the successor's entry, while the successor's handle
    /// becomes stale.
    pub(crate) fn erase_node(&mut self, handle: Handle) -> Removed<K, V> {
        let node = self.node(handle);
        if let (Some(_), Some(right)) = (node.left(), node.right()) {
            let successor = self.subtree_first(right);
            let (key, value, parent) = self.unlink(successor);

            let target = self.node_mut(handle);
            let key = target.replace_key(key);
            let old_value = target.value();
            target.set_value(value);

            Removed {
                key,
                value: self.values.take(old_value),
                parent,
            }
        } else {
            let (key, value, parent) = self.unlink(handle);
            Removed {
                key,
                value: self.values.take(value),
                parent,
            }
        }
    }

    /// Unlinks and frees a node with at most one child, splicing the child into its place.
    /// Returns the node's key, its value handle and its former parent.
    fn unlink(&mut self, handle: Handle) -> (K, Handle, Option<Handle>) {
        let node = self.node(handle);
        debug_assert!(
            node.left().is_none() || node.right().is_none(),
            "`RawBSTree::unlink()` - node has two children!"
        );
        let parent = node.parent();
        let child = node.left().or(node.right());

        if let Some(child) = child {
            self.node_mut(child).set_parent(parent);
        }
        self.replace_child(parent, handle, child);

        let node = self.nodes.take(handle);
        self.allocator.deallocate(1);
        self.len -= 1;

        let value = node.value();
        (node.into_key(), value, parent)
    }

    /// Destroys every node with an explicit-stack walk and returns their storage.
    pub(crate) fn clear(&mut self) {
        let mut stack: Stack = SmallVec::new();
        stack.extend(self.root);

        let mut freed = 0;
        while let Some(handle) = stack.pop() {
            let node = self.nodes.take(handle);
            stack.extend(node.left());
            stack.extend(node.right());
            self.values.free(node.value());
            freed += 1;
        }
        debug_assert_eq!(freed, self.len, "`RawBSTree::clear()` - reachable nodes != len!");
        debug_assert!(self.nodes.is_empty() && self.values.is_empty());

        self.allocator.deallocate(freed);
        self.root = None;
        self.len = 0;
        log::trace!("cleared {freed} nodes");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;
    use crate::allocator::{Bounded, Global};
    use crate::error::Error;

    /// Inserts `key` with `Ord` as the comparator; returns the node and whether it is new.
    pub(crate) fn insert<V, A: NodeAllocator>(tree: &mut RawBSTree<i32, V, A>, key: i32, value: V) -> Result<(Handle, bool)> {
        match tree.search_by(|k| key.cmp(k)) {
            SearchResult::Found(handle) => Ok((handle, false)),
            SearchResult::NotFound(slot) => Ok((tree.link_new(slot, key, value)?, true)),
        }
    }

    pub(crate) fn find<V, A>(tree: &RawBSTree<i32, V, A>, key: i32) -> Option<Handle> {
        match tree.search_by(|k| key.cmp(k)) {
            SearchResult::Found(handle) => Some(handle),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn build(keys: &[i32]) -> RawBSTree<i32, i32, Global> {
        let mut tree = RawBSTree::new(Global);
        for &key in keys {
            insert(&mut tree, key, key * 10).unwrap();
        }
        tree
    }

    pub(crate) fn in_order(tree: &RawBSTree<i32, i32, Global>) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = tree.in_order_first();
        while let Some(handle) = current {
            keys.push(*tree.key(handle));
            current = tree.in_order_next(handle);
        }
        keys
    }

    /// Checks ordering, parent/child agreement, root parent, and `len`.
    pub(crate) fn check_invariants<V, A>(tree: &RawBSTree<i32, V, A>) {
        let mut stack: Vec<(Handle, Option<i32>, Option<i32>)> = Vec::new();
        if let Some(root) = tree.root() {
            assert_eq!(tree.parent(root), None, "root has a parent");
            stack.push((root, None, None));
        }

        let mut reachable = 0;
        while let Some((handle, low, high)) = stack.pop() {
            reachable += 1;
            let key = *tree.key(handle);
            assert!(low.is_none_or(|low| low < key), "key {key} violates lower bound {low:?}");
            assert!(high.is_none_or(|high| key < high), "key {key} violates upper bound {high:?}");
            if let Some(left) = tree.left(handle) {
                assert_eq!(tree.parent(left), Some(handle), "left child of {key} has wrong parent");
                stack.push((left, low, Some(key)));
            }
            if let Some(right) = tree.right(handle) {
                assert_eq!(tree.parent(right), Some(handle), "right child of {key} has wrong parent");
                stack.push((right, Some(key), high));
            }
        }
        assert_eq!(reachable, tree.len());
        assert_eq!(tree.nodes.len(), tree.len());
        assert_eq!(tree.values.len(), tree.len());
    }

    #[test]
    fn insert_and_search() {
        let tree = build(&[10, 5, 15, 3, 7]);
        check_invariants(&tree);
        assert_eq!(tree.len(), 5);
        assert_eq!(in_order(&tree), [3, 5, 7, 10, 15]);

        let seven = find(&tree, 7).unwrap();
        assert_eq!(*tree.value(seven), 70);
        assert_eq!(tree.depth(seven), 2);
        assert_eq!(find(&tree, 99), None);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = build(&[10, 5]);
        let (handle, inserted) = insert(&mut tree, 5, 0).unwrap();
        assert!(!inserted);
        assert_eq!(*tree.value(handle), 50);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn bounds() {
        let tree = build(&[10, 5, 15, 3, 7]);
        let key = |h: Option<Handle>| h.map(|h| *tree.key(h));

        assert_eq!(key(tree.lower_bound_by(|k| 7.cmp(k))), Some(7));
        assert_eq!(key(tree.lower_bound_by(|k| 8.cmp(k))), Some(10));
        assert_eq!(key(tree.upper_bound_by(|k| 7.cmp(k))), Some(10));
        assert_eq!(key(tree.upper_bound_by(|k| 2.cmp(k))), Some(3));
        assert_eq!(key(tree.lower_bound_by(|k| 16.cmp(k))), None);
        assert_eq!(key(tree.upper_bound_by(|k| 15.cmp(k))), None);
    }

    #[test]
    fn erase_leaf() {
        let mut tree = build(&[10, 5, 15, 3, 7]);
        let three = find(&tree, 3).unwrap();
        let removed = tree.erase_node(three);
        assert_eq!((removed.key, removed.value), (3, 30));
        assert_eq!(removed.parent, find(&tree, 5));
        assert!(!tree.contains(three));
        check_invariants(&tree);
        assert_eq!(in_order(&tree), [5, 7, 10, 15]);
    }

    #[test]
    fn erase_two_children_promotes_successor_payload() {
        let mut tree = build(&[10, 5, 15, 3, 7]);
        let five = find(&tree, 5).unwrap();
        let seven = find(&tree, 7).unwrap();

        let removed = tree.erase_node(five);
        assert_eq!((removed.key, removed.value), (5, 50));
        check_invariants(&tree);
        assert_eq!(in_order(&tree), [3, 7, 10, 15]);

        // The node that held 5 now holds 7; the successor's own node is gone.
        assert_eq!(*tree.key(five), 7);
        assert_eq!(*tree.value(five), 70);
        assert!(!tree.contains(seven));
        assert_eq!(removed.parent, Some(five));
    }

    #[test]
    fn erase_root_with_one_child() {
        let mut tree = build(&[10, 15, 12]);
        let root = tree.root().unwrap();
        tree.erase_node(root);
        check_invariants(&tree);
        assert_eq!(*tree.key(tree.root().unwrap()), 15);
        assert_eq!(in_order(&tree), [12, 15]);
    }

    #[test]
    fn erase_successor_that_is_right_child() {
        let mut tree = build(&[10, 5, 15, 20]);
        let root = tree.root().unwrap();
        tree.erase_node(root);
        check_invariants(&tree);
        assert_eq!(*tree.key(root), 15);
        assert_eq!(in_order(&tree), [5, 15, 20]);
    }

    #[test]
    fn clear_frees_everything() {
        let mut tree = RawBSTree::new(Bounded::new(8));
        for key in [4, 2, 6, 1, 3, 5, 7] {
            insert(&mut tree, key, ()).unwrap();
        }
        let old_root = tree.root().unwrap();
        assert_eq!(tree.allocator().in_use(), 7);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.allocator().in_use(), 0);
        assert!(!tree.contains(old_root));
        check_invariants(&tree);
    }

    #[test]
    fn failed_allocation_leaves_tree_unchanged() {
        let mut tree = RawBSTree::new(Bounded::new(2));
        insert(&mut tree, 2, ()).unwrap();
        insert(&mut tree, 1, ()).unwrap();
        assert_eq!(insert(&mut tree, 3, ()), Err(Error::AllocationFailed));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.right(tree.root().unwrap()), None);
        check_invariants(&tree);
    }

    #[test]
    fn drain_yields_in_order() {
        let mut tree = build(&[10, 5, 15, 3, 7]);
        let drained = tree.drain_to_vec();
        assert_eq!(drained, [(3, 30), (5, 50), (7, 70), (10, 100), (15, 150)]);
        assert!(tree.is_empty());
        check_invariants(&tree);
    }
}
