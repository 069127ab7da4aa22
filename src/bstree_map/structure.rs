use core::fmt;

use crate::allocator::{Global, NodeAllocator};
use crate::error::{Error, Result};
use crate::raw::{Handle, Node, RawBSTree, Removed, Side};

/// The node links of a [`BSTreeMap`](crate::BSTreeMap), addressed by [`Handle`].
///
/// This is the surface a [`Policy`](crate::Policy) works with: it can read the
/// shape of the tree, edit values, restructure subtrees with rotations and erase
/// nodes, but it can never change a key or allocate. Every operation that takes a
/// handle fails with [`Error::StaleHandle`] if the node has been freed.
///
/// # Examples
///
/// ```
/// use bstree::BSTreeMap;
///
/// let mut map = BSTreeMap::from([(10, 'a'), (5, 'b'), (15, 'c')]);
/// let tree = map.structure_mut();
/// let root = tree.root().unwrap();
/// assert_eq!(tree.key(root), Ok(&10));
///
/// let new_root = tree.rotate_right(root).unwrap();
/// assert_eq!(tree.key(new_root), Ok(&5));
/// assert_eq!(tree.root(), Some(new_root));
/// assert_eq!(tree.depth(root), Ok(1));
/// ```
pub struct Structure<K, V, A = Global> {
    raw: RawBSTree<K, V, A>,
}

impl<K, V, A> Structure<K, V, A> {
    pub(crate) const fn new(allocator: A) -> Self {
        Self {
            raw: RawBSTree::new(allocator),
        }
    }

    pub(crate) fn with_capacity(capacity: usize, allocator: A) -> Self {
        Self {
            raw: RawBSTree::with_capacity(capacity, allocator),
        }
    }

    #[inline]
    pub(crate) fn raw(&self) -> &RawBSTree<K, V, A> {
        &self.raw
    }

    #[inline]
    pub(crate) fn raw_mut(&mut self) -> &mut RawBSTree<K, V, A> {
        &mut self.raw
    }

    /// Projects a structure pointer onto its engine without creating a reference.
    ///
    /// # Safety
    /// - `this` must point to a valid, allocated `Structure<K, V, A>`.
    #[inline]
    pub(crate) unsafe fn raw_ptr(this: *mut Self) -> *mut RawBSTree<K, V, A> {
        // SAFETY: Caller guarantees `this` is valid; no reference is formed.
        unsafe { core::ptr::addr_of_mut!((*this).raw) }
    }

    fn live(&self, node: Handle) -> Result<&Node<K>> {
        self.raw.try_node(node).ok_or(Error::StaleHandle)
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the root node, or `None` if the tree is empty.
    #[must_use]
    pub fn root(&self) -> Option<Handle> {
        self.raw.root()
    }

    /// Returns true if `node` names a live node of this tree.
    #[must_use]
    pub fn contains(&self, node: Handle) -> bool {
        self.raw.contains(node)
    }

    /// Returns the allocator that grants this tree's nodes.
    pub fn allocator(&self) -> &A {
        self.raw.allocator()
    }

    /// Returns the parent of `node`, or `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn parent(&self, node: Handle) -> Result<Option<Handle>> {
        Ok(self.live(node)?.parent())
    }

    /// Returns the left child of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn left(&self, node: Handle) -> Result<Option<Handle>> {
        Ok(self.live(node)?.left())
    }

    /// Returns the right child of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn right(&self, node: Handle) -> Result<Option<Handle>> {
        Ok(self.live(node)?.right())
    }

    /// Returns the number of parent hops from `node` to the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    ///
    /// # Complexity
    ///
    /// O(depth)
    pub fn depth(&self, node: Handle) -> Result<usize> {
        self.live(node)?;
        Ok(self.raw.depth(node))
    }

    /// Returns the key stored at `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn key(&self, node: Handle) -> Result<&K> {
        Ok(self.live(node)?.key())
    }

    /// Returns the value stored at `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn value(&self, node: Handle) -> Result<&V> {
        self.live(node)?;
        Ok(self.raw.value(node))
    }

    /// Returns the value stored at `node` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    pub fn value_mut(&mut self, node: Handle) -> Result<&mut V> {
        self.live(node)?;
        Ok(self.raw.value_mut(node))
    }

    /// Promotes the right child of `node` into its place and returns it.
    ///
    /// ```text
    ///     x                y
    ///    / \              / \
    ///   a   y     =>     x   c
    ///      / \          / \
    ///     b   c        a   b
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if it has no right child. The tree is
    /// unchanged on error.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn rotate_left(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.rotate_left(node)
    }

    /// Promotes the left child of `node` into its place and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if it has no left child. The tree is
    /// unchanged on error.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn rotate_right(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.rotate_right(node)
    }

    /// Rotates left twice, promoting the right child's right child (zig-zig).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if the right-right grandchild is missing.
    /// The tree is unchanged on error.
    pub fn double_left(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.double_rotate(node, Side::Left)
    }

    /// Rotates right twice, promoting the left child's left child (zig-zig).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if the left-left grandchild is missing.
    /// The tree is unchanged on error.
    pub fn double_right(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.double_rotate(node, Side::Right)
    }

    /// Rotates the right child right, then `node` left, promoting the right
    /// child's left child (zig-zag).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if the right-left grandchild is missing.
    /// The tree is unchanged on error.
    pub fn big_left(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.big_rotate(node, Side::Left)
    }

    /// Rotates the left child left, then `node` right, promoting the left
    /// child's right child (zig-zag).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live, or
    /// [`Error::InvalidOperation`] if the left-right grandchild is missing.
    /// The tree is unchanged on error.
    pub fn big_right(&mut self, node: Handle) -> Result<Handle> {
        self.live(node)?;
        self.raw.big_rotate(node, Side::Right)
    }
}

impl<K, V, A: NodeAllocator> Structure<K, V, A> {
    pub(crate) fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        A: Clone,
    {
        Ok(Self {
            raw: self.raw.try_clone()?,
        })
    }

    /// Erases `node` with the standard unlink/promote algorithm.
    ///
    /// A node with at most one child is unlinked and its child takes its place.
    /// A node with two children takes over the key and value of its in-order
    /// successor, whose own node is unlinked instead: `node` stays live holding
    /// the successor's entry, and the successor's handle becomes stale.
    ///
    /// This does not run [`Policy::erase`](crate::Policy::erase). Policies call
    /// it to perform the erase they are asked for; any other caller leaves a
    /// policy's own bookkeeping (balance factors, counters) unaware of the
    /// removal. Erase through the map to keep the policy informed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `node` is not live.
    ///
    /// # Complexity
    ///
    /// O(height)
    pub fn erase_node(&mut self, node: Handle) -> Result<Removed<K, V>> {
        self.live(node)?;
        Ok(self.raw.erase_node(node))
    }
}

impl<K, V, A> fmt::Debug for Structure<K, V, A>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("len", &self.len())
            .field("root", &self.root().map(|root| self.raw.key(root)))
            .finish_non_exhaustive()
    }
}
