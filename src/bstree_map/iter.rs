use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::Structure;
use crate::allocator::Global;
use crate::order::{InOrder, Order};
use crate::raw::{Handle, RawBSTree};

/// An iterator over the entries of a `BSTreeMap` in the order `O`.
///
/// This `struct` is created by the [`iter`], [`traverse`], [`pre_order`],
/// [`in_order`] and [`post_order`] methods on [`BSTreeMap`]. Use
/// [`rev`](Iterator::rev) for the reverse traversal.
///
/// # Examples
///
/// ```
/// use bstree::BSTreeMap;
///
/// let map = BSTreeMap::from([(2, "b"), (1, "a"), (3, "c")]);
/// let mut iter = map.post_order();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next_back(), Some((&2, &"b")));
/// assert_eq!(iter.next(), Some((&3, &"c")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`BSTreeMap`]: crate::BSTreeMap
/// [`iter`]: crate::BSTreeMap::iter
/// [`traverse`]: crate::BSTreeMap::traverse
/// [`pre_order`]: crate::BSTreeMap::pre_order
/// [`in_order`]: crate::BSTreeMap::in_order
/// [`post_order`]: crate::BSTreeMap::post_order
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V, O = InOrder, A = Global> {
    tree: &'a Structure<K, V, A>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
    _order: PhantomData<O>,
}

/// A mutable iterator over the entries of a `BSTreeMap` in the order `O`.
///
/// This `struct` is created by the [`iter_mut`], [`traverse_mut`],
/// [`pre_order_mut`], [`in_order_mut`] and [`post_order_mut`] methods on
/// [`BSTreeMap`].
///
/// # Examples
///
/// ```
/// use bstree::BSTreeMap;
///
/// let mut map = BSTreeMap::from([(1, 10), (2, 20)]);
/// for (_, value) in map.pre_order_mut() {
///     *value += 1;
/// }
/// let values: Vec<_> = map.values().copied().collect();
/// assert_eq!(values, [11, 21]);
/// ```
///
/// [`BSTreeMap`]: crate::BSTreeMap
/// [`iter_mut`]: crate::BSTreeMap::iter_mut
/// [`traverse_mut`]: crate::BSTreeMap::traverse_mut
/// [`pre_order_mut`]: crate::BSTreeMap::pre_order_mut
/// [`in_order_mut`]: crate::BSTreeMap::in_order_mut
/// [`post_order_mut`]: crate::BSTreeMap::post_order_mut
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct IterMut<'a, K, V, O = InOrder, A = Global> {
    tree: *mut Structure<K, V, A>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
    _marker: PhantomData<(&'a mut Structure<K, V, A>, O)>,
}

// SAFETY: IterMut behaves as &mut Structure<K, V, A>, handing out `&K` and `&mut V`.
// It is NOT Sync because mutable iterators should not be shared across threads.
unsafe impl<K: Sync, V: Send, O, A: Send> Send for IterMut<'_, K, V, O, A> {}

/// An owning iterator over the entries of a `BSTreeMap`, sorted by key.
///
/// This `struct` is created by the [`into_iter`] method on `BSTreeMap`
/// (provided by the [`IntoIterator`] trait).
///
/// [`into_iter`]: IntoIterator::into_iter
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<(K, V)>,
}

/// An iterator over the keys of a `BSTreeMap`, in sorted order.
///
/// This `struct` is created by the [`keys`](crate::BSTreeMap::keys) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V, A = Global> {
    inner: Iter<'a, K, V, InOrder, A>,
}

/// An iterator over the values of a `BSTreeMap`, in order by key.
///
/// This `struct` is created by the [`values`](crate::BSTreeMap::values) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V, A = Global> {
    inner: Iter<'a, K, V, InOrder, A>,
}

/// A mutable iterator over the values of a `BSTreeMap`, in order by key.
///
/// This `struct` is created by the [`values_mut`](crate::BSTreeMap::values_mut) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct ValuesMut<'a, K, V, A = Global> {
    inner: IterMut<'a, K, V, InOrder, A>,
}

/// An iterator over a sub-range of entries in a `BSTreeMap`, sorted by key.
///
/// This `struct` is created by the [`range`](crate::BSTreeMap::range) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V, A = Global> {
    tree: &'a Structure<K, V, A>,
    // Both ends are inside the range, or both are `None`.
    front: Option<Handle>,
    back: Option<Handle>,
}

impl<'a, K, V, O: Order, A> Iter<'a, K, V, O, A> {
    pub(crate) fn new(tree: &'a Structure<K, V, A>) -> Self {
        Self {
            tree,
            front: O::first(tree),
            back: O::last(tree),
            remaining: tree.len(),
            _order: PhantomData,
        }
    }

    fn entry(&self, node: Handle) -> (&'a K, &'a V) {
        let raw = self.tree.raw();
        (raw.key(node), raw.value(node))
    }
}

impl<'a, K, V, O: Order, A> Iterator for Iter<'a, K, V, O, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;
        self.remaining -= 1;
        self.front = O::next(self.tree, node);
        Some(self.entry(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, O: Order, A> DoubleEndedIterator for Iter<'_, K, V, O, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;
        self.remaining -= 1;
        self.back = O::prev(self.tree, node);
        Some(self.entry(node))
    }
}

impl<K, V, O: Order, A> ExactSizeIterator for Iter<'_, K, V, O, A> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V, O: Order, A> FusedIterator for Iter<'_, K, V, O, A> {}

impl<K, V, O, A> Clone for Iter<'_, K, V, O, A> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            _order: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, O: Order, A> fmt::Debug for Iter<'_, K, V, O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V, O: Order, A> IterMut<'a, K, V, O, A> {
    pub(crate) fn new(tree: &'a mut Structure<K, V, A>) -> Self {
        Self {
            front: O::first(tree),
            back: O::last(tree),
            remaining: tree.len(),
            tree,
            _marker: PhantomData,
        }
    }

    /// Hands out the entry at `node`.
    ///
    /// # Safety
    /// - `node` must be live and must not have been handed out before.
    unsafe fn entry(&mut self, node: Handle) -> (&'a K, &'a mut V) {
        // SAFETY: `self.tree` comes from the `&'a mut` borrow taken in `new()`. Keys are only read,
        // and every value is reached at most once, so no two `&mut V` alias.
        unsafe {
            let raw = Structure::raw_ptr(self.tree);
            let node = RawBSTree::node_ptr(raw, node);
            (node.key(), RawBSTree::value_mut_ptr(raw, node.value()))
        }
    }

    /// Steps with a shared view of the links.
    fn step(&self, step: fn(&Structure<K, V, A>, Handle) -> Option<Handle>, node: Handle) -> Option<Handle> {
        // SAFETY: The shared borrow only lives for this call and only reads node links. Values live
        // in their own allocation, which this never reads, so values handed out earlier stay valid.
        let tree = unsafe { &*self.tree };
        step(tree, node)
    }
}

impl<'a, K, V, O: Order, A> Iterator for IterMut<'a, K, V, O, A> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;
        self.remaining -= 1;
        self.front = self.step(O::next, node);
        // SAFETY: `remaining` ends both walks before they cross, so `node` is visited once.
        Some(unsafe { self.entry(node) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, O: Order, A> DoubleEndedIterator for IterMut<'_, K, V, O, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;
        self.remaining -= 1;
        self.back = self.step(O::prev, node);
        // SAFETY: `remaining` ends both walks before they cross, so `node` is visited once.
        Some(unsafe { self.entry(node) })
    }
}

impl<K, V, O: Order, A> ExactSizeIterator for IterMut<'_, K, V, O, A> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V, O: Order, A> FusedIterator for IterMut<'_, K, V, O, A> {}

impl<K, V, O, A> fmt::Debug for IterMut<'_, K, V, O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("remaining", &self.remaining).finish()
    }
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(entries: alloc::vec::Vec<(K, V)>) -> Self {
        Self {
            inner: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<'a, K, V, A> Keys<'a, K, V, A> {
    pub(crate) fn new(inner: Iter<'a, K, V, InOrder, A>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, A> Iterator for Keys<'a, K, V, A> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A> DoubleEndedIterator for Keys<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V, A> ExactSizeIterator for Keys<'_, K, V, A> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V, A> FusedIterator for Keys<'_, K, V, A> {}

impl<K, V, A> Clone for Keys<'_, K, V, A> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V, A> fmt::Debug for Keys<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V, A> Values<'a, K, V, A> {
    pub(crate) fn new(inner: Iter<'a, K, V, InOrder, A>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, A> Iterator for Values<'a, K, V, A> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A> DoubleEndedIterator for Values<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V, A> ExactSizeIterator for Values<'_, K, V, A> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V, A> FusedIterator for Values<'_, K, V, A> {}

impl<K, V, A> Clone for Values<'_, K, V, A> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug, A> fmt::Debug for Values<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V, A> ValuesMut<'a, K, V, A> {
    pub(crate) fn new(inner: IterMut<'a, K, V, InOrder, A>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, A> Iterator for ValuesMut<'a, K, V, A> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A> DoubleEndedIterator for ValuesMut<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V, A> ExactSizeIterator for ValuesMut<'_, K, V, A> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V, A> FusedIterator for ValuesMut<'_, K, V, A> {}

impl<K, V, A> fmt::Debug for ValuesMut<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuesMut").field("remaining", &self.inner.len()).finish()
    }
}

impl<'a, K, V, A> Range<'a, K, V, A> {
    pub(crate) fn new(tree: &'a Structure<K, V, A>, ends: Option<(Handle, Handle)>) -> Self {
        Self {
            tree,
            front: ends.map(|(front, _)| front),
            back: ends.map(|(_, back)| back),
        }
    }

    fn entry(&self, node: Handle) -> (&'a K, &'a V) {
        let raw = self.tree.raw();
        (raw.key(node), raw.value(node))
    }

    fn finish_if_met(&mut self, node: Handle) -> bool {
        if self.front == self.back {
            debug_assert_eq!(self.front, Some(node));
            self.front = None;
            self.back = None;
            true
        } else {
            false
        }
    }
}

impl<'a, K, V, A> Iterator for Range<'a, K, V, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.front?;
        if !self.finish_if_met(node) {
            self.front = self.tree.raw().in_order_next(node);
        }
        Some(self.entry(node))
    }
}

impl<K, V, A> DoubleEndedIterator for Range<'_, K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = self.back?;
        if !self.finish_if_met(node) {
            self.back = self.tree.raw().in_order_prev(node);
        }
        Some(self.entry(node))
    }
}

impl<K, V, A> FusedIterator for Range<'_, K, V, A> {}

impl<K, V, A> Clone for Range<'_, K, V, A> {
    fn clone(&self) -> Self {
        Range {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, A> fmt::Debug for Range<'_, K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
