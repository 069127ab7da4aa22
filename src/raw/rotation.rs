//! Subtree rotations.
//!
//! Each rotation takes the handle of a subtree root, restructures the subtree in
//! place and returns the handle of the node now at its top. The promoted node
//! takes over the old root's parent link, or the tree root. Rotations never
//! allocate, never change `len`, and keep the in-order sequence intact.
//! Preconditions are checked before any link is touched, so a failed rotation
//! leaves the tree as it was.

use super::handle::Handle;
use super::node::Side;
use super::raw_bstree::RawBSTree;
use crate::error::{Error, Result};

const NO_RIGHT_CHILD: &str = "node has no right child to promote";
const NO_LEFT_CHILD: &str = "node has no left child to promote";
const NO_RIGHT_GRANDCHILD: &str = "right child has no child on the required side";
const NO_LEFT_GRANDCHILD: &str = "left child has no child on the required side";

impl<K, V, A> RawBSTree<K, V, A> {
    /// Returns the child that a rotation of `handle` toward `direction` would promote.
    fn promoted(&self, handle: Handle, direction: Side) -> Result<Handle> {
        self.node(handle).child(direction.opposite()).ok_or_else(|| {
            let reason = match direction {
                Side::Left => NO_RIGHT_CHILD,
                Side::Right => NO_LEFT_CHILD,
            };
            log::debug!("rejected rotation of {handle:?}: {reason}");
            Error::InvalidOperation(reason)
        })
    }

    /// Returns the grandchild of `handle` on `outer` then `inner`.
    fn grandchild(&self, handle: Handle, outer: Side, inner: Side) -> Result<Handle> {
        let child = self.promoted(handle, outer.opposite())?;
        self.node(child).child(inner).ok_or_else(|| {
            let reason = match outer {
                Side::Left => NO_LEFT_GRANDCHILD,
                Side::Right => NO_RIGHT_GRANDCHILD,
            };
            log::debug!("rejected rotation of {handle:?}: {reason}");
            Error::InvalidOperation(reason)
        })
    }

    /// Single rotation toward `direction`: `Side::Left` promotes the right child.
    pub(crate) fn rotate(&mut self, x: Handle, direction: Side) -> Result<Handle> {
        let y = self.promoted(x, direction)?;
        let inner = self.node(y).child(direction);
        let parent = self.node(x).parent();

        // The promoted child's inner subtree moves across to `x`.
        self.set_child(x, direction.opposite(), inner);
        if let Some(inner) = inner {
            self.set_parent(inner, Some(x));
        }

        // `y` takes `x`'s place under the grandparent (or as root).
        self.set_parent(y, parent);
        self.replace_child(parent, x, Some(y));

        self.set_child(y, direction, Some(x));
        self.set_parent(x, Some(y));
        Ok(y)
    }

    pub(crate) fn rotate_left(&mut self, x: Handle) -> Result<Handle> {
        self.rotate(x, Side::Left)
    }

    pub(crate) fn rotate_right(&mut self, x: Handle) -> Result<Handle> {
        self.rotate(x, Side::Right)
    }

    /// Two consecutive rotations toward `direction` (zig-zig).
    pub(crate) fn double_rotate(&mut self, x: Handle, direction: Side) -> Result<Handle> {
        let outer = direction.opposite();
        self.grandchild(x, outer, outer)?;
        let y = self.rotate(x, direction)?;
        self.rotate(y, direction)
    }

    /// Rotates the child away from `direction` first, then `x` toward it (zig-zag).
    pub(crate) fn big_rotate(&mut self, x: Handle, direction: Side) -> Result<Handle> {
        let outer = direction.opposite();
        self.grandchild(x, outer, direction)?;
        let child = self.promoted(x, direction)?;
        self.rotate(child, outer)?;
        self.rotate(x, direction)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::super::raw_bstree::tests::{build, check_invariants, find, in_order};
    use super::*;
    use crate::allocator::Global;
    use proptest::prelude::*;

    fn pre_order(tree: &RawBSTree<i32, i32, Global>) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = tree.pre_order_first();
        while let Some(handle) = current {
            keys.push(*tree.key(handle));
            current = tree.pre_order_next(handle);
        }
        keys
    }

    #[test]
    fn rotate_left_at_root() {
        let mut tree = build(&[10, 5, 15, 3, 7]);
        let root = tree.root().unwrap();
        let promoted = tree.rotate_left(root).unwrap();

        assert_eq!(*tree.key(promoted), 15);
        assert_eq!(tree.root(), Some(promoted));
        assert_eq!(tree.parent(promoted), None);
        assert_eq!(tree.left(promoted), Some(root));
        assert_eq!(pre_order(&tree), [15, 10, 5, 3, 7]);
        assert_eq!(in_order(&tree), [3, 5, 7, 10, 15]);
        check_invariants(&tree);
    }

    #[test]
    fn rotate_right_below_root_relinks_grandparent() {
        let mut tree = build(&[10, 5, 15, 3, 7]);
        let five = find(&tree, 5).unwrap();
        let promoted = tree.rotate_right(five).unwrap();

        assert_eq!(*tree.key(promoted), 3);
        assert_eq!(tree.left(tree.root().unwrap()), Some(promoted));
        assert_eq!(tree.parent(promoted), tree.root());
        assert_eq!(pre_order(&tree), [10, 3, 5, 7, 15]);
        check_invariants(&tree);
    }

    #[test]
    fn double_rotations() {
        let mut tree = build(&[1, 2, 3]);
        let root = tree.root().unwrap();
        let top = tree.double_rotate(root, Side::Left).unwrap();
        assert_eq!(*tree.key(top), 3);
        assert_eq!(pre_order(&tree), [3, 2, 1]);
        check_invariants(&tree);

        let top = tree.double_rotate(top, Side::Right).unwrap();
        assert_eq!(*tree.key(top), 1);
        assert_eq!(pre_order(&tree), [1, 2, 3]);
        check_invariants(&tree);
    }

    #[test]
    fn big_rotations() {
        let mut tree = build(&[10, 20, 15]);
        let root = tree.root().unwrap();
        let top = tree.big_rotate(root, Side::Left).unwrap();
        assert_eq!(*tree.key(top), 15);
        assert_eq!(pre_order(&tree), [15, 10, 20]);
        check_invariants(&tree);

        let mut tree = build(&[10, 5, 7]);
        let root = tree.root().unwrap();
        let top = tree.big_rotate(root, Side::Right).unwrap();
        assert_eq!(*tree.key(top), 7);
        assert_eq!(pre_order(&tree), [7, 5, 10]);
        check_invariants(&tree);
    }

    #[test]
    fn missing_children_are_rejected_without_changes() {
        let mut tree = build(&[10, 5, 3]);
        let root = tree.root().unwrap();
        let before = pre_order(&tree);

        assert_eq!(tree.rotate_left(root), Err(Error::InvalidOperation(NO_RIGHT_CHILD)));
        assert_eq!(tree.double_rotate(root, Side::Left), Err(Error::InvalidOperation(NO_RIGHT_CHILD)));
        // Left child exists, but it has no right child for a zig-zag.
        assert_eq!(tree.big_rotate(root, Side::Right), Err(Error::InvalidOperation(NO_LEFT_GRANDCHILD)));
        assert_eq!(pre_order(&tree), before);
        check_invariants(&tree);
    }

    proptest! {
        #[test]
        fn rotations_preserve_in_order(
            keys in prop::collection::vec(-100i32..100, 1..64),
            picks in prop::collection::vec((any::<prop::sample::Index>(), 0u8..6), 1..16),
        ) {
            let mut tree = build(&keys);
            let expected = in_order(&tree);
            let mut handles = Vec::new();
            let mut current = tree.in_order_first();
            while let Some(handle) = current {
                handles.push(handle);
                current = tree.in_order_next(handle);
            }

            for (index, kind) in picks {
                let x = *index.get(&handles);
                let result = match kind {
                    0 => tree.rotate_left(x),
                    1 => tree.rotate_right(x),
                    2 => tree.double_rotate(x, Side::Left),
                    3 => tree.double_rotate(x, Side::Right),
                    4 => tree.big_rotate(x, Side::Left),
                    _ => tree.big_rotate(x, Side::Right),
                };
                prop_assert!(matches!(result, Ok(_) | Err(Error::InvalidOperation(_))));
                check_invariants(&tree);
                prop_assert_eq!(&in_order(&tree), &expected);
            }
        }
    }
}
