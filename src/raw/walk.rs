//! Traversal stepping over parent/left/right links.
//!
//! Every step is a function of the current node and the tree's links alone, so
//! a position is a single handle and copying it copies the whole traversal state.

use super::handle::Handle;
use super::raw_bstree::RawBSTree;

impl<K, V, A> RawBSTree<K, V, A> {
    /// Leftmost node of the subtree rooted at `handle`.
    pub(crate) fn subtree_first(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.left(handle) {
            handle = left;
        }
        handle
    }

    /// Rightmost node of the subtree rooted at `handle`.
    pub(crate) fn subtree_last(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.right(handle) {
            handle = right;
        }
        handle
    }

    // Descends to a leaf, preferring left children: the first post-order node of the subtree.
    fn descend_left_first(&self, mut handle: Handle) -> Handle {
        loop {
            let node = self.node(handle);
            match node.left().or(node.right()) {
                Some(child) => handle = child,
                None => return handle,
            }
        }
    }

    // Descends to a leaf, preferring right children: the last pre-order node of the subtree.
    fn descend_right_first(&self, mut handle: Handle) -> Handle {
        loop {
            let node = self.node(handle);
            match node.right().or(node.left()) {
                Some(child) => handle = child,
                None => return handle,
            }
        }
    }

    // ─── In-order ────────────────────────────────────────────────────────────

    pub(crate) fn in_order_first(&self) -> Option<Handle> {
        self.root().map(|root| self.subtree_first(root))
    }

    pub(crate) fn in_order_last(&self) -> Option<Handle> {
        self.root().map(|root| self.subtree_last(root))
    }

    pub(crate) fn in_order_next(&self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.right(handle) {
            return Some(self.subtree_first(right));
        }
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            if self.left(parent) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    pub(crate) fn in_order_prev(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.left(handle) {
            return Some(self.subtree_last(left));
        }
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            if self.right(parent) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    // ─── Pre-order ───────────────────────────────────────────────────────────

    pub(crate) fn pre_order_first(&self) -> Option<Handle> {
        self.root()
    }

    pub(crate) fn pre_order_last(&self) -> Option<Handle> {
        self.root().map(|root| self.descend_right_first(root))
    }

    pub(crate) fn pre_order_next(&self, handle: Handle) -> Option<Handle> {
        let node = self.node(handle);
        if let Some(child) = node.left().or(node.right()) {
            return Some(child);
        }
        // Leaf: resume at the right subtree of the nearest ancestor we reached from its left.
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            let node = self.node(parent);
            if node.left() == Some(current) {
                if let Some(right) = node.right() {
                    return Some(right);
                }
            }
            current = parent;
        }
        None
    }

    pub(crate) fn pre_order_prev(&self, handle: Handle) -> Option<Handle> {
        let parent = self.parent(handle)?;
        match self.left(parent) {
            Some(left) if left != handle => Some(self.descend_right_first(left)),
            _ => Some(parent),
        }
    }

    // ─── Post-order ──────────────────────────────────────────────────────────

    pub(crate) fn post_order_first(&self) -> Option<Handle> {
        self.root().map(|root| self.descend_left_first(root))
    }

    pub(crate) fn post_order_last(&self) -> Option<Handle> {
        self.root()
    }

    pub(crate) fn post_order_next(&self, handle: Handle) -> Option<Handle> {
        let parent = self.parent(handle)?;
        let node = self.node(parent);
        match node.right() {
            Some(right) if node.left() == Some(handle) => Some(self.descend_left_first(right)),
            _ => Some(parent),
        }
    }

    pub(crate) fn post_order_prev(&self, handle: Handle) -> Option<Handle> {
        let node = self.node(handle);
        if let Some(child) = node.right().or(node.left()) {
            return Some(child);
        }
        // Leaf: step to the left subtree of the nearest ancestor we reached from its right.
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            let node = self.node(parent);
            if node.right() == Some(current) {
                if let Some(left) = node.left() {
                    return Some(left);
                }
            }
            current = parent;
        }
        None
    }
}
