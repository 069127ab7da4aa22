//! Compile-time extension points for balancing trees.
//!
//! A [`Policy`] is chosen as a type parameter of [`BSTreeMap`](crate::BSTreeMap)
//! and its functions are monomorphized into every mutation, so the default
//! [`Plain`] policy costs nothing. A balancing variant (splay, AVL, ...)
//! overrides the hooks and reshapes the tree through [`Structure`]'s rotations.

use crate::allocator::NodeAllocator;
use crate::bstree_map::Structure;
use crate::raw::{Handle, Removed};

/// Hooks the map calls at fixed points of its operations.
///
/// Hooks may rotate freely. Handles survive rotations, so the map keeps
/// pointing at the same entry after a hook returns.
///
/// # Examples
///
/// A move-to-root policy, which rotates every inserted node up to the root:
///
/// ```
/// use bstree::{BSTreeMap, Handle, Natural, NodeAllocator, Policy, Structure};
///
/// struct MoveToRoot;
///
/// impl<K, V> Policy<K, V> for MoveToRoot {
///     fn post_insert<A: NodeAllocator>(tree: &mut Structure<K, V, A>, node: Handle) {
///         while let Ok(Some(parent)) = tree.parent(node) {
///             let rotated = if tree.left(parent) == Ok(Some(node)) {
///                 tree.rotate_right(parent)
///             } else {
///                 tree.rotate_left(parent)
///             };
///             if rotated.is_err() {
///                 break;
///             }
///         }
///     }
/// }
///
/// let mut map: BSTreeMap<i32, (), Natural, MoveToRoot> = BSTreeMap::with_parts(Natural, Default::default());
/// for key in [5, 3, 8, 1] {
///     map.insert(key, ()).unwrap();
/// }
/// let tree = map.structure();
/// assert_eq!(tree.key(tree.root().unwrap()), Ok(&1));
/// ```
pub trait Policy<K, V> {
    /// Called after a mutable lookup finds `node`.
    fn post_search<A: NodeAllocator>(_tree: &mut Structure<K, V, A>, _node: Handle) {}

    /// Called after insert links the new leaf `node`.
    fn post_insert<A: NodeAllocator>(_tree: &mut Structure<K, V, A>, _node: Handle) {}

    /// Erases `node` and returns its entry.
    ///
    /// The default delegates to [`Structure::erase_node`]. Overrides must remove
    /// exactly the entry stored at `node` and may rebalance afterwards, starting
    /// from [`Removed::parent`].
    fn erase<A: NodeAllocator>(tree: &mut Structure<K, V, A>, node: Handle) -> Removed<K, V> {
        tree.raw_mut().erase_node(node)
    }
}

/// The unbalanced binary search tree: every hook keeps its default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Plain;

impl<K, V> Policy<K, V> for Plain {}
