//! Traversal orders.
//!
//! An [`Order`] is a zero-sized type whose functions step between positions using
//! only the parent/left/right links of the tree. Cursors and iterators are
//! generic over it, so one cursor type covers every order and direction.

use core::fmt;
use core::marker::PhantomData;

use crate::bstree_map::Structure;
use crate::raw::Handle;

/// A traversal sequence over the nodes of a tree.
///
/// Stepping functions take the current node and return the next (or previous)
/// one, or `None` past the end. They keep no state between calls.
///
/// # Panics
///
/// `next` and `prev` may panic if `node` is not a live node of `tree`.
pub trait Order: Copy + Default + fmt::Debug {
    /// Returns the first node of the traversal.
    fn first<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle>;

    /// Returns the last node of the traversal.
    fn last<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle>;

    /// Returns the node visited after `node`.
    fn next<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle>;

    /// Returns the node visited before `node`.
    fn prev<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle>;
}

/// Node, then left subtree, then right subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PreOrder;

/// Left subtree, then node, then right subtree: ascending key order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InOrder;

/// Left subtree, then right subtree, then node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PostOrder;

/// The order `O` walked backwards.
///
/// ```
/// use bstree::{BSTreeMap, PreOrder, Reversed};
///
/// let map = BSTreeMap::from([(10, ()), (5, ()), (15, ()), (3, ()), (7, ())]);
/// let keys: Vec<_> = map.traverse::<Reversed<PreOrder>>().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [15, 7, 3, 5, 10]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<O>(PhantomData<O>);

pub type ReversePreOrder = Reversed<PreOrder>;
pub type ReverseInOrder = Reversed<InOrder>;
pub type ReversePostOrder = Reversed<PostOrder>;

impl Order for PreOrder {
    #[inline]
    fn first<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().pre_order_first()
    }

    #[inline]
    fn last<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().pre_order_last()
    }

    #[inline]
    fn next<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().pre_order_next(node)
    }

    #[inline]
    fn prev<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().pre_order_prev(node)
    }
}

impl Order for InOrder {
    #[inline]
    fn first<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().in_order_first()
    }

    #[inline]
    fn last<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().in_order_last()
    }

    #[inline]
    fn next<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().in_order_next(node)
    }

    #[inline]
    fn prev<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().in_order_prev(node)
    }
}

impl Order for PostOrder {
    #[inline]
    fn first<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().post_order_first()
    }

    #[inline]
    fn last<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        tree.raw().post_order_last()
    }

    #[inline]
    fn next<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().post_order_next(node)
    }

    #[inline]
    fn prev<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        tree.raw().post_order_prev(node)
    }
}

impl<O: Order> Order for Reversed<O> {
    #[inline]
    fn first<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        O::last(tree)
    }

    #[inline]
    fn last<K, V, A>(tree: &Structure<K, V, A>) -> Option<Handle> {
        O::first(tree)
    }

    #[inline]
    fn next<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        O::prev(tree, node)
    }

    #[inline]
    fn prev<K, V, A>(tree: &Structure<K, V, A>, node: Handle) -> Option<Handle> {
        O::next(tree, node)
    }
}
