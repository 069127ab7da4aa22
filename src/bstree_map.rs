use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Bound, Index, RangeBounds};

use crate::allocator::{Global, NodeAllocator};
use crate::comparator::{Comparator, Natural};
use crate::error::{Error, Result};
use crate::order::{InOrder, Order, PostOrder, PreOrder};
use crate::policy::{Plain, Policy};
use crate::raw::{Handle, Removed, SearchResult};

mod cursor;
mod iter;
mod structure;

pub use cursor::{Cursor, CursorMut};
pub use iter::{IntoIter, Iter, IterMut, Keys, Range, Values, ValuesMut};
pub use structure::Structure;

/// Validates that the start bound does not exceed the end bound.
///
/// # Panics
///
/// Panics if `start > end` or if `start == end` and both bounds are `Excluded`.
fn validate_range_bounds<Q, C, R>(comparator: &C, range: &R)
where
    Q: ?Sized,
    C: Comparator<Q>,
    R: RangeBounds<Q>,
{
    if let (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) =
        (range.start_bound(), range.end_bound())
    {
        let order = comparator.compare(start, end);
        let valid =
            if matches!(range.start_bound(), Bound::Excluded(_)) && matches!(range.end_bound(), Bound::Excluded(_)) {
                order == Ordering::Less
            } else {
                order != Ordering::Greater
            };
        assert!(valid, "range start is greater than range end in BSTreeMap");
    }
}

/// Erases `node` through the policy and returns the in-order position that now
/// holds the entry which followed it.
///
/// After a two-child erase the successor's node is gone and its entry lives in
/// `node`, so the walk continues from `node` itself.
fn erase_and_advance<K, V, P, A>(tree: &mut Structure<K, V, A>, node: Handle) -> (Removed<K, V>, Option<Handle>)
where
    P: Policy<K, V>,
    A: NodeAllocator,
{
    let successor = tree.raw().in_order_next(node);
    let removed = P::erase(tree, node);
    let next = match successor {
        Some(successor) if tree.contains(successor) => Some(successor),
        Some(_) if tree.contains(node) => Some(node),
        _ => None,
    };
    (removed, next)
}

/// An ordered map based on a [binary search tree].
///
/// Keys are ordered by a [`Comparator`] `C` (their [`Ord`] implementation by
/// default). Every entry lives in its own node, linked to its parent and its
/// two children; no balancing is performed unless a [`Policy`] `P` adds it
/// through the tree's hooks. Node storage is granted by a [`NodeAllocator`] `A`,
/// and a refused allocation leaves the map untouched.
///
/// Besides the usual sorted iteration the map can be walked in pre-order,
/// in-order and post-order, forwards or backwards, with iterators or with
/// [`Cursor`]s that report their depth in the tree. The node links themselves
/// are available through [`structure`](BSTreeMap::structure).
///
/// Operations that search the tree take O(h) time, where h is the height of the
/// tree: O(log n) for a tree built from random keys, O(n) for keys inserted in
/// sorted order.
///
/// It is a logic error for a key to be modified in such a way that the key's
/// ordering relative to any other key changes while it is in the map. The
/// behavior resulting from such a logic error is not specified, but will be
/// encapsulated to the `BSTreeMap` that observed the logic error and not result
/// in undefined behavior.
///
/// # Examples
///
/// ```
/// use bstree::{BSTreeMap, Error};
///
/// let mut movie_reviews = BSTreeMap::new();
///
/// // review some movies.
/// movie_reviews.insert("Office Space",       "Deals with real issues in the workplace.").unwrap();
/// movie_reviews.insert("Pulp Fiction",       "Masterpiece.").unwrap();
/// movie_reviews.insert("The Godfather",      "Very enjoyable.").unwrap();
/// movie_reviews.insert("The Blues Brothers", "Eye lyked it a lot.").unwrap();
///
/// // check for a specific one.
/// if !movie_reviews.contains_key("Les Miserables") {
///     println!("We've got {} reviews, but Les Miserables ain't one.",
///              movie_reviews.len());
/// }
///
/// // oops, this review has a lot of spelling mistakes, let's delete it.
/// assert_eq!(movie_reviews.erase("The Blues Brothers"), 1);
///
/// // direct access reports missing keys as errors.
/// assert_eq!(movie_reviews.at("Up!"), Err(Error::KeyNotFound));
/// assert_eq!(movie_reviews.at("Office Space"), Ok(&"Deals with real issues in the workplace."));
///
/// // iterate over everything.
/// for (movie, review) in &movie_reviews {
///     println!("{movie}: \"{review}\"");
/// }
/// ```
///
/// A `BSTreeMap` with a known list of items can be initialized from an array:
///
/// ```
/// use bstree::BSTreeMap;
///
/// let solar_distance = BSTreeMap::from([
///     ("Mercury", 0.4),
///     ("Venus", 0.7),
///     ("Earth", 1.0),
///     ("Mars", 1.5),
/// ]);
/// ```
///
/// [binary search tree]: https://en.wikipedia.org/wiki/Binary_search_tree
pub struct BSTreeMap<K, V, C = Natural, P = Plain, A: NodeAllocator = Global> {
    tree: Structure<K, V, A>,
    comparator: C,
    _policy: PhantomData<fn() -> P>,
}

impl<K, V> BSTreeMap<K, V> {
    /// Makes a new, empty `BSTreeMap`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    ///
    /// // entries can now be inserted into the empty map
    /// map.insert(1, "a").unwrap();
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::with_parts(Natural, Global)
    }

    /// Makes a new, empty `BSTreeMap` with room for at least `capacity` nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map: BSTreeMap<i32, i32> = BSTreeMap::with_capacity(10);
    /// assert!(map.capacity() >= 10);
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Structure::with_capacity(capacity, Global),
            comparator: Natural,
            _policy: PhantomData,
        }
    }
}

impl<K, V, C> BSTreeMap<K, V, C> {
    /// Makes a new, empty `BSTreeMap` ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Descending};
    ///
    /// let map = BSTreeMap::<i32, (), _>::with_comparator(Descending);
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self::with_parts(comparator, Global)
    }
}

impl<K, V, A: NodeAllocator> BSTreeMap<K, V, Natural, Plain, A> {
    /// Makes a new, empty `BSTreeMap` whose nodes are granted by `allocator`.
    #[must_use]
    pub const fn with_allocator(allocator: A) -> Self {
        Self::with_parts(Natural, allocator)
    }
}

impl<K, V, C, P, A: NodeAllocator> BSTreeMap<K, V, C, P, A> {
    /// Makes a new, empty `BSTreeMap` from a comparator and an allocator. The
    /// policy is chosen by the map's type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Bounded, Descending, Plain};
    ///
    /// let mut map: BSTreeMap<i32, (), Descending, Plain, Bounded> =
    ///     BSTreeMap::with_parts(Descending, Bounded::new(16));
    /// map.insert(1, ()).unwrap();
    /// assert_eq!(map.allocator().in_use(), 1);
    /// ```
    #[must_use]
    pub const fn with_parts(comparator: C, allocator: A) -> Self {
        Self {
            tree: Structure::new(allocator),
            comparator,
            _policy: PhantomData,
        }
    }

    /// Returns the number of elements in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains no elements.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of nodes the map can hold before its storage grows.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.raw().capacity()
    }

    /// Returns the comparator that orders the keys.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the node allocator.
    pub fn allocator(&self) -> &A {
        self.tree.allocator()
    }

    /// Returns a read-only view of the node links.
    pub fn structure(&self) -> &Structure<K, V, A> {
        &self.tree
    }

    /// Returns a view of the node links that can rotate subtrees and edit values.
    ///
    /// Rotations keep every key in order, so the map stays consistent whatever
    /// the caller does through the view.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(10, ()), (5, ()), (15, ()), (3, ()), (7, ())]);
    /// let root = map.structure().root().unwrap();
    /// map.structure_mut().rotate_left(root).unwrap();
    ///
    /// let pre: Vec<_> = map.pre_order().map(|(k, _)| *k).collect();
    /// assert_eq!(pre, [15, 10, 5, 3, 7]);
    /// assert!(map.keys().copied().eq([3, 5, 7, 10, 15]));
    /// ```
    pub fn structure_mut(&mut self) -> &mut Structure<K, V, A> {
        &mut self.tree
    }

    /// Swaps the contents of two maps. Each allocator moves with the nodes it granted.
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Makes a deep copy of the map, with the same shape and handles.
    ///
    /// The copy's nodes are granted by a clone of this map's allocator, which is
    /// asked for all of them at once before anything is copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the allocator refuses the nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Bounded, Natural, Plain};
    ///
    /// let mut map: BSTreeMap<i32, char, Natural, Plain, Bounded> = BSTreeMap::with_allocator(Bounded::new(4));
    /// map.insert(1, 'a').unwrap();
    /// map.insert(2, 'b').unwrap();
    ///
    /// let copy = map.try_clone().unwrap();
    /// assert_eq!(copy, map);
    /// assert_eq!(copy.allocator().in_use(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        C: Clone,
        A: Clone,
    {
        Ok(Self {
            tree: self.tree.try_clone()?,
            comparator: self.comparator.clone(),
            _policy: PhantomData,
        })
    }

    /// Returns the first key-value pair in the map.
    /// The key in this pair is the minimum key in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    /// assert_eq!(map.first_key_value(), None);
    /// map.insert(1, "b").unwrap();
    /// map.insert(2, "a").unwrap();
    /// assert_eq!(map.first_key_value(), Some((&1, &"b")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let raw = self.tree.raw();
        raw.in_order_first().map(|node| (raw.key(node), raw.value(node)))
    }

    /// Returns the last key-value pair in the map.
    /// The key in this pair is the maximum key in the map.
    ///
    /// # Complexity
    ///
    /// O(h)
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let raw = self.tree.raw();
        raw.in_order_last().map(|node| (raw.key(node), raw.value(node)))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    /// map.insert(3, "c").unwrap();
    /// map.insert(2, "b").unwrap();
    /// map.insert(1, "a").unwrap();
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    ///
    /// let (first_key, first_value) = map.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h) to create the iterator; O(n) for a full traversal.
    pub fn iter(&self) -> Iter<'_, K, V, InOrder, A> {
        Iter::new(&self.tree)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([("a", 1), ("b", 2), ("c", 3)]);
    ///
    /// // add 10 to the value if the key isn't "a"
    /// for (key, value) in map.iter_mut() {
    ///     if key != &"a" {
    ///         *value += 10;
    ///     }
    /// }
    /// assert!(map.values().copied().eq([1, 12, 13]));
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, InOrder, A> {
        IterMut::new(&mut self.tree)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let a = BSTreeMap::from([(2, "b"), (1, "a")]);
    /// let keys: Vec<_> = a.keys().cloned().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V, A> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V, A> {
        Values::new(self.iter())
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut a = BSTreeMap::from([(1, String::from("hello")), (2, String::from("goodbye"))]);
    /// for value in a.values_mut() {
    ///     value.push_str("!");
    /// }
    /// let values: Vec<String> = a.values().cloned().collect();
    /// assert_eq!(values, [String::from("hello!"), String::from("goodbye!")]);
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, A> {
        ValuesMut::new(self.iter_mut())
    }

    /// Gets an iterator over the entries of the map in the traversal order `O`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, PostOrder, Reversed};
    ///
    /// let map = BSTreeMap::from([(10, ()), (5, ()), (15, ()), (3, ()), (7, ())]);
    /// let post: Vec<_> = map.traverse::<PostOrder>().map(|(k, _)| *k).collect();
    /// assert_eq!(post, [3, 7, 5, 15, 10]);
    ///
    /// let back: Vec<_> = map.traverse::<Reversed<PostOrder>>().map(|(k, _)| *k).collect();
    /// assert_eq!(back, [10, 15, 5, 7, 3]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h) to create the iterator; O(n) for a full traversal.
    pub fn traverse<O: Order>(&self) -> Iter<'_, K, V, O, A> {
        Iter::new(&self.tree)
    }

    /// Gets a mutable iterator over the entries of the map in the traversal order `O`.
    pub fn traverse_mut<O: Order>(&mut self) -> IterMut<'_, K, V, O, A> {
        IterMut::new(&mut self.tree)
    }

    /// Gets an iterator visiting each node before its subtrees, left before right.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map = BSTreeMap::from([(10, ()), (5, ()), (15, ()), (3, ()), (7, ())]);
    /// let pre: Vec<_> = map.pre_order().map(|(k, _)| *k).collect();
    /// assert_eq!(pre, [10, 5, 3, 7, 15]);
    /// ```
    pub fn pre_order(&self) -> Iter<'_, K, V, PreOrder, A> {
        self.traverse()
    }

    /// Gets an iterator over the entries sorted by key. Same as [`iter`](BSTreeMap::iter).
    pub fn in_order(&self) -> Iter<'_, K, V, InOrder, A> {
        self.traverse()
    }

    /// Gets an iterator visiting each node after its subtrees, left before right.
    pub fn post_order(&self) -> Iter<'_, K, V, PostOrder, A> {
        self.traverse()
    }

    /// Mutable counterpart of [`pre_order`](BSTreeMap::pre_order).
    pub fn pre_order_mut(&mut self) -> IterMut<'_, K, V, PreOrder, A> {
        self.traverse_mut()
    }

    /// Mutable counterpart of [`in_order`](BSTreeMap::in_order).
    pub fn in_order_mut(&mut self) -> IterMut<'_, K, V, InOrder, A> {
        self.traverse_mut()
    }

    /// Mutable counterpart of [`post_order`](BSTreeMap::post_order).
    pub fn post_order_mut(&mut self) -> IterMut<'_, K, V, PostOrder, A> {
        self.traverse_mut()
    }

    /// Returns a cursor at the first entry of the order `O`, or at the end if
    /// the map is empty.
    pub fn cursor_first<O: Order>(&self) -> Cursor<'_, K, V, O, A> {
        Cursor::new(&self.tree, O::first(&self.tree))
    }

    /// Returns a cursor at the end position of the order `O`.
    pub fn cursor_end<O: Order>(&self) -> Cursor<'_, K, V, O, A> {
        Cursor::new(&self.tree, None)
    }

    /// Returns a cursor at the node `node`, walking in the order `O`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the node has been erased.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Error, PreOrder};
    ///
    /// let mut map = BSTreeMap::from([(2, 'b'), (1, 'a'), (3, 'c')]);
    /// let one = map.find(&1).handle().unwrap();
    ///
    /// let mut cursor = map.cursor_at::<PreOrder>(one).unwrap();
    /// cursor.move_next().unwrap();
    /// assert_eq!(cursor.key(), Ok(&3));
    ///
    /// map.remove(&1);
    /// assert_eq!(map.cursor_at::<PreOrder>(one).err(), Some(Error::StaleHandle));
    /// ```
    pub fn cursor_at<O: Order>(&self, node: Handle) -> Result<Cursor<'_, K, V, O, A>> {
        if !self.tree.contains(node) {
            return Err(Error::StaleHandle);
        }
        Ok(Cursor::new(&self.tree, Some(node)))
    }

    /// Mutable counterpart of [`cursor_first`](BSTreeMap::cursor_first).
    pub fn cursor_first_mut<O: Order>(&mut self) -> CursorMut<'_, K, V, O, P, A> {
        let first = O::first(&self.tree);
        CursorMut::new(&mut self.tree, first)
    }

    /// Mutable counterpart of [`cursor_end`](BSTreeMap::cursor_end).
    pub fn cursor_end_mut<O: Order>(&mut self) -> CursorMut<'_, K, V, O, P, A> {
        CursorMut::new(&mut self.tree, None)
    }

    /// Mutable counterpart of [`cursor_at`](BSTreeMap::cursor_at).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the node has been erased.
    pub fn cursor_at_mut<O: Order>(&mut self, node: Handle) -> Result<CursorMut<'_, K, V, O, P, A>> {
        if !self.tree.contains(node) {
            return Err(Error::StaleHandle);
        }
        Ok(CursorMut::new(&mut self.tree, Some(node)))
    }

    fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.tree.raw().search_by(|k| self.comparator.compare(key, k.borrow()))
    }

    fn find_node<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        match self.search(key) {
            SearchResult::Found(node) => Some(node),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Returns the first and last in-order nodes inside `range`, if any.
    fn range_ends<Q, R>(&self, range: &R) -> Option<(Handle, Handle)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        R: RangeBounds<Q>,
    {
        validate_range_bounds(&self.comparator, range);
        let raw = self.tree.raw();

        let front = match range.start_bound() {
            Bound::Included(start) => raw.lower_bound_by(|k| self.comparator.compare(start, k.borrow())),
            Bound::Excluded(start) => raw.upper_bound_by(|k| self.comparator.compare(start, k.borrow())),
            Bound::Unbounded => raw.in_order_first(),
        }?;

        // The back end is the node just before the first key past the range.
        let past = match range.end_bound() {
            Bound::Included(end) => raw.upper_bound_by(|k| self.comparator.compare(end, k.borrow())),
            Bound::Excluded(end) => raw.lower_bound_by(|k| self.comparator.compare(end, k.borrow())),
            Bound::Unbounded => None,
        };
        let back = match past {
            Some(past) => raw.in_order_prev(past),
            None => raw.in_order_last(),
        }?;

        let order = self.comparator.compare(raw.key(front).borrow(), raw.key(back).borrow());
        (order != Ordering::Greater).then_some((front, back))
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find_node(key).map(|node| self.tree.raw().value(node))
    }

    /// Returns the key-value pair corresponding to the supplied key.
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let raw = self.tree.raw();
        self.find_node(key).map(|node| (raw.key(node), raw.value(node)))
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map = BSTreeMap::from([(1, "a")]);
    /// assert_eq!(map.contains_key(&1), true);
    /// assert_eq!(map.contains_key(&2), false);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Returns the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Error};
    ///
    /// let map = BSTreeMap::from([(1, "a")]);
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a cursor at the entry for `key`, or the end cursor if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Error};
    ///
    /// let map = BSTreeMap::from([(10, "a"), (5, "b"), (15, "c"), (3, "d"), (7, "e")]);
    /// assert_eq!(map.find(&7).get(), Ok((&7, &"e")));
    /// assert_eq!(map.find(&7).depth(), Some(2));
    ///
    /// let missing = map.find(&99);
    /// assert!(missing.is_end());
    /// assert_eq!(missing.get(), Err(Error::OutOfRange));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, InOrder, A>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        Cursor::new(&self.tree, self.find_node(key))
    }

    /// Returns a cursor at the first entry whose key is not less than `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map = BSTreeMap::from([(10, ()), (20, ()), (30, ())]);
    /// assert_eq!(map.lower_bound(&20).key(), Ok(&20));
    /// assert_eq!(map.lower_bound(&21).key(), Ok(&30));
    /// assert!(map.lower_bound(&31).is_end());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, InOrder, A>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.tree.raw().lower_bound_by(|k| self.comparator.compare(key, k.borrow()));
        Cursor::new(&self.tree, node)
    }

    /// Returns a cursor at the first entry whose key is greater than `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map = BSTreeMap::from([(10, ()), (20, ()), (30, ())]);
    /// assert_eq!(map.upper_bound(&20).key(), Ok(&30));
    /// assert_eq!(map.upper_bound(&9).key(), Ok(&10));
    /// assert!(map.upper_bound(&30).is_end());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, InOrder, A>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.tree.raw().upper_bound_by(|k| self.comparator.compare(key, k.borrow()));
        Cursor::new(&self.tree, node)
    }

    /// Constructs a double-ended iterator over a sub-range of entries in the map.
    /// The simplest way is to use the range syntax `min..max`, thus `range(min..max)` will
    /// yield elements from min (inclusive) to max (exclusive).
    /// The range may also be entered as `(Bound<T>, Bound<T>)`, so for example
    /// `range((Excluded(4), Included(10)))` will yield a left-exclusive, right-inclusive
    /// range from 4 to 10.
    ///
    /// # Panics
    ///
    /// Panics if range `start > end`.
    /// Panics if range `start == end` and both bounds are `Excluded`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    /// use std::ops::Bound::Included;
    ///
    /// let mut map = BSTreeMap::new();
    /// map.insert(3, "a").unwrap();
    /// map.insert(5, "b").unwrap();
    /// map.insert(8, "c").unwrap();
    /// for (&key, &value) in map.range((Included(&4), Included(&8))) {
    ///     println!("{key}: {value}");
    /// }
    /// assert_eq!(Some((&5, &"b")), map.range(4..).next());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h) to create the iterator.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V, A>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        R: RangeBounds<Q>,
    {
        Range::new(&self.tree, self.range_ends(&range))
    }
}

impl<K, V, C, P, A> BSTreeMap<K, V, C, P, A>
where
    P: Policy<K, V>,
    A: NodeAllocator,
{
    /// Links `key` into the tree, or finds its node. Runs the matching policy hook.
    fn place(&mut self, key: K, value: V, assign: bool) -> Result<(Handle, bool)>
    where
        C: Comparator<K>,
    {
        let search = self.tree.raw().search_by(|k| self.comparator.compare(&key, k));
        match search {
            SearchResult::Found(node) => {
                if assign {
                    *self.tree.raw_mut().value_mut(node) = value;
                }
                P::post_search(&mut self.tree, node);
                Ok((node, false))
            }
            SearchResult::NotFound(slot) => {
                let node = self.tree.raw_mut().link_new(slot, key, value)?;
                P::post_insert(&mut self.tree, node);
                Ok((node, true))
            }
        }
    }

    /// Finds `key` for mutation, running the search hook on a hit.
    fn search_mut<Q>(&mut self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.find_node(key)?;
        P::post_search(&mut self.tree, node);
        Some(node)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns a cursor at the entry for `key` and whether a new entry was
    /// created. If the key was already present the map is left unchanged and
    /// `value` is dropped; see [`insert_or_assign`](BSTreeMap::insert_or_assign)
    /// to overwrite instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the allocator refuses a new node.
    /// The map is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    /// let (cursor, inserted) = map.insert(37, "a").unwrap();
    /// assert!(inserted);
    /// assert_eq!(cursor.get(), Ok((&37, &"a")));
    ///
    /// let (cursor, inserted) = map.insert(37, "b").unwrap();
    /// assert!(!inserted);
    /// assert_eq!(cursor.get(), Ok((&37, &"a")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn insert(&mut self, key: K, value: V) -> Result<(CursorMut<'_, K, V, InOrder, P, A>, bool)>
    where
        C: Comparator<K>,
    {
        let (node, inserted) = self.place(key, value, false)?;
        Ok((CursorMut::new(&mut self.tree, Some(node)), inserted))
    }

    /// Inserts a key-value pair, overwriting the value if the key is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the allocator refuses a new node.
    /// The map is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::new();
    /// map.insert_or_assign(37, "a").unwrap();
    /// let cursor = map.insert_or_assign(37, "b").unwrap();
    /// assert_eq!(cursor.get(), Ok((&37, &"b")));
    /// assert_eq!(map.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Result<CursorMut<'_, K, V, InOrder, P, A>>
    where
        C: Comparator<K>,
    {
        let (node, _) = self.place(key, value, true)?;
        Ok(CursorMut::new(&mut self.tree, Some(node)))
    }

    /// Inserts every pair from `iter`, overwriting values of keys already
    /// present. Returns the number of new entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] as soon as a node is refused. Pairs
    /// before the failing one stay inserted; the rest of `iter` is not consumed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::{BSTreeMap, Bounded, Error};
    ///
    /// let mut map = BSTreeMap::with_allocator(Bounded::new(3));
    /// assert_eq!(map.try_extend([(1, 'a'), (2, 'b'), (1, 'c')]), Ok(2));
    /// assert_eq!(map.try_extend([(3, 'd'), (4, 'e')]), Err(Error::AllocationFailed));
    /// assert!(map.into_iter().eq([(1, 'c'), (2, 'b'), (3, 'd')]));
    /// ```
    pub fn try_extend<I>(&mut self, iter: I) -> Result<usize>
    where
        C: Comparator<K>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut inserted = 0;
        for (key, value) in iter {
            if self.place(key, value, true)?.1 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(1, "a")]);
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.search_mut(key)?;
        Some(self.tree.raw_mut().value_mut(node))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable cursor at the entry for `key`, or the end cursor if the
    /// key is absent.
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, InOrder, P, A>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.search_mut(key);
        CursorMut::new(&mut self.tree, node)
    }

    /// Removes a key from the map, returning the number of entries removed (0 or 1).
    ///
    /// When the key's node has two children, the entry of its in-order successor
    /// is moved into that node and the successor's node is freed instead. A
    /// [`Handle`] to the key's node then observes the successor's entry, while a
    /// handle to the successor's node becomes stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(10, ()), (5, ()), (15, ()), (3, ()), (7, ())]);
    /// let five = map.find(&5).handle().unwrap();
    ///
    /// assert_eq!(map.erase(&5), 1);
    /// assert_eq!(map.erase(&5), 0);
    /// assert!(map.keys().copied().eq([3, 7, 10, 15]));
    ///
    /// // 7 was promoted into the node that held 5.
    /// assert_eq!(map.structure().key(five), Ok(&7));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        usize::from(self.remove_entry(key).is_some())
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(1, "a")]);
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let node = self.find_node(key)?;
        let removed = P::erase(&mut self.tree, node);
        Some((removed.key, removed.value))
    }

    /// Removes and returns the first element in the map.
    /// The key of this element is the minimum key that was in the map.
    ///
    /// # Examples
    ///
    /// Draining elements in ascending order, while keeping a usable map each iteration.
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(1, "a"), (2, "b")]);
    /// while let Some((key, _val)) = map.pop_first() {
    ///     assert!(map.iter().all(|(k, _v)| *k > key));
    /// }
    /// assert!(map.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node = self.tree.raw().in_order_first()?;
        let removed = P::erase(&mut self.tree, node);
        Some((removed.key, removed.value))
    }

    /// Removes and returns the last element in the map.
    /// The key of this element is the maximum key that was in the map.
    ///
    /// # Complexity
    ///
    /// O(h)
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node = self.tree.raw().in_order_last()?;
        let removed = P::erase(&mut self.tree, node);
        Some((removed.key, removed.value))
    }

    /// Removes every entry whose key lies in `range`, returning how many were removed.
    ///
    /// # Panics
    ///
    /// Panics if range `start > end`.
    /// Panics if range `start == end` and both bounds are `Excluded`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map: BSTreeMap<i32, ()> = (0..10).map(|k| (k, ())).collect();
    /// assert_eq!(map.erase_range(3..7), 4);
    /// assert!(map.keys().copied().eq([0, 1, 2, 7, 8, 9]));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(k · h) for k removed entries.
    pub fn erase_range<Q, R>(&mut self, range: R) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        R: RangeBounds<Q>,
    {
        let Some((front, back)) = self.range_ends(&range) else {
            return 0;
        };

        let mut count = 1;
        let mut node = front;
        while node != back {
            let Some(next) = self.tree.raw().in_order_next(node) else { break };
            count += 1;
            node = next;
        }

        // Each erase leaves the walk on the entry that followed the erased one.
        let mut current = Some(front);
        for _ in 0..count {
            let Some(node) = current else { break };
            current = erase_and_advance::<K, V, P, A>(&mut self.tree, node).1;
        }
        count
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all pairs `(k, v)` for which `f(&k, &mut v)` returns `false`.
    /// The elements are visited in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map: BSTreeMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// // Keep only the elements with even-numbered keys.
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert!(map.into_iter().eq(vec![(0, 0), (2, 20), (4, 40), (6, 60)]));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n · h) in the worst case.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut current = self.tree.raw().in_order_first();
        while let Some(node) = current {
            let (key, value) = self.tree.raw_mut().entry_mut(node);
            current = if f(key, value) {
                self.tree.raw().in_order_next(node)
            } else {
                erase_and_advance::<K, V, P, A>(&mut self.tree, node).1
            };
        }
    }

    /// Clears the map, removing all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut a = BSTreeMap::from([(1, "a")]);
    /// a.clear();
    /// assert!(a.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.tree.raw_mut().clear();
    }
}

impl<K: Clone, V: Clone, C: Clone, P, A: NodeAllocator + Clone> Clone for BSTreeMap<K, V, C, P, A> {
    /// Makes a deep copy of the map, with the same shape, through a clone of its allocator.
    ///
    /// # Panics
    ///
    /// Panics if the allocator refuses the copied nodes; use
    /// [`try_clone`](BSTreeMap::try_clone) to handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(map) => map,
            Err(err) => panic!("`BSTreeMap::clone()` - {err}"),
        }
    }
}

impl<K, V, C, P, A: NodeAllocator> Drop for BSTreeMap<K, V, C, P, A> {
    /// Destroys every node and returns its storage to the allocator.
    fn drop(&mut self) {
        if !self.is_empty() {
            self.tree.raw_mut().clear();
        }
    }
}

impl<K: Hash, V: Hash, C, P, A: NodeAllocator> Hash for BSTreeMap<K, V, C, P, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq, C, P, A: NodeAllocator> PartialEq for BSTreeMap<K, V, C, P, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq, C, P, A: NodeAllocator> Eq for BSTreeMap<K, V, C, P, A> {}

impl<K: PartialOrd, V: PartialOrd, C, P, A: NodeAllocator> PartialOrd for BSTreeMap<K, V, C, P, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord, C, P, A: NodeAllocator> Ord for BSTreeMap<K, V, C, P, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, P, A: NodeAllocator> fmt::Debug for BSTreeMap<K, V, C, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Default, P, A: NodeAllocator + Default> Default for BSTreeMap<K, V, C, P, A> {
    fn default() -> Self {
        Self::with_parts(C::default(), A::default())
    }
}

impl<K, V, C, P, A> FromIterator<(K, V)> for BSTreeMap<K, V, C, P, A>
where
    C: Comparator<K> + Default,
    P: Policy<K, V>,
    A: NodeAllocator + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C, P, A> Extend<(K, V)> for BSTreeMap<K, V, C, P, A>
where
    C: Comparator<K>,
    P: Policy<K, V>,
    A: NodeAllocator,
{
    /// Inserts every pair, overwriting values of keys already present.
    ///
    /// # Panics
    ///
    /// Panics if the allocator refuses a node; use
    /// [`try_extend`](BSTreeMap::try_extend) to handle that case.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        if let Err(err) = self.try_extend(iter) {
            panic!("`BSTreeMap::extend()` - {err}");
        }
    }
}

impl<'a, K: Copy, V: Copy, C, P, A> Extend<(&'a K, &'a V)> for BSTreeMap<K, V, C, P, A>
where
    C: Comparator<K>,
    P: Policy<K, V>,
    A: NodeAllocator,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<'a, K, V, C, P, A: NodeAllocator> IntoIterator for &'a BSTreeMap<K, V, C, P, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, InOrder, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, P, A: NodeAllocator> IntoIterator for &'a mut BSTreeMap<K, V, C, P, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, InOrder, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C, P, A: NodeAllocator> IntoIterator for BSTreeMap<K, V, C, P, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map = BSTreeMap::from([(2, "b"), (1, "a")]);
    /// let mut iter = map.into_iter();
    /// assert_eq!(iter.next(), Some((1, "a")));
    /// assert_eq!(iter.next_back(), Some((2, "b")));
    /// ```
    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter::new(self.tree.raw_mut().drain_to_vec())
    }
}

impl<K, Q, V, C, P, A> Index<&Q> for BSTreeMap<K, V, C, P, A>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Comparator<Q>,
    A: NodeAllocator,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the `BSTreeMap`.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for BSTreeMap<K, V> {
    /// Converts a `[(K, V); N]` into a `BSTreeMap<K, V>`, inserting the pairs in array order.
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let map1 = BSTreeMap::from([(1, 2), (3, 4)]);
    /// let map2: BSTreeMap<_, _> = [(1, 2), (3, 4)].into();
    /// assert_eq!(map1, map2);
    /// ```
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::allocator::Bounded;
    use crate::comparator::Descending;

    fn keys<C, P, A: NodeAllocator>(map: &BSTreeMap<i32, i32, C, P, A>) -> Vec<i32> {
        map.keys().copied().collect()
    }

    #[test]
    fn range_ends_cover_bounds() {
        let map: BSTreeMap<i32, i32> = [10, 5, 15, 3, 7].into_iter().map(|k| (k, k)).collect();
        let ends = |lo: Bound<i32>, hi: Bound<i32>| {
            map.range_ends(&(lo, hi)).map(|(a, b)| (*map.tree.raw().key(a), *map.tree.raw().key(b)))
        };
        assert_eq!(ends(Bound::Included(5), Bound::Included(10)), Some((5, 10)));
        assert_eq!(ends(Bound::Excluded(5), Bound::Excluded(10)), Some((7, 7)));
        assert_eq!(ends(Bound::Included(8), Bound::Included(9)), None);
        assert_eq!(ends(Bound::Unbounded, Bound::Excluded(3)), None);
        assert_eq!(ends(Bound::Excluded(15), Bound::Unbounded), None);
        assert_eq!(ends(Bound::Unbounded, Bound::Unbounded), Some((3, 15)));
    }

    #[test]
    #[should_panic(expected = "range start is greater than range end in BSTreeMap")]
    fn inverted_range_panics() {
        let map: BSTreeMap<i32, i32> = BSTreeMap::new();
        let _ = map.range(5..3);
    }

    #[test]
    fn descending_comparator_reverses_ranges() {
        let map: BSTreeMap<i32, i32, Descending> = (0..10).map(|k| (k, k)).collect();
        let got: Vec<i32> = map.range(7..=3).map(|(k, _)| *k).collect();
        assert_eq!(got, [7, 6, 5, 4, 3]);
    }

    #[test]
    fn erase_range_across_two_child_nodes() {
        let mut map: BSTreeMap<i32, i32> = [50, 30, 70, 20, 40, 60, 80, 35, 45].into_iter().map(|k| (k, k)).collect();
        assert_eq!(map.erase_range(30..=60), 6);
        assert_eq!(keys(&map), [20, 70, 80]);
        assert_eq!(map.erase_range(..), 3);
        assert!(map.is_empty());
    }

    #[test]
    fn retain_with_promotion() {
        let mut map: BSTreeMap<i32, i32> = [50, 30, 70, 20, 40, 60, 80].into_iter().map(|k| (k, k)).collect();
        let mut seen = Vec::new();
        map.retain(|&k, v| {
            seen.push(k);
            *v += 1;
            k % 20 != 10
        });
        assert_eq!(seen, [20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(keys(&map), [20, 40, 60, 80]);
        assert!(map.values().copied().eq([21, 41, 61, 81]));
    }

    #[test]
    fn failed_insert_leaves_map_untouched() {
        let mut map = BSTreeMap::with_allocator(Bounded::new(1));
        map.insert(1, 1).unwrap();
        assert_eq!(map.insert(2, 2).err(), Some(Error::AllocationFailed));
        assert_eq!(map.insert_or_assign(1, 5).map(|c| c.get().map(|(_, v)| *v)).ok(), Some(Ok(5)));
        assert_eq!(keys(&map), [1]);
        assert_eq!(map.allocator().in_use(), 1);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = BSTreeMap::from([(1, 1)]);
        let mut b = BSTreeMap::from([(2, 2), (3, 3)]);
        a.swap(&mut b);
        assert_eq!(keys(&a), [2, 3]);
        assert_eq!(keys(&b), [1]);
    }
}
