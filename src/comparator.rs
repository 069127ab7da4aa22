//! Key ordering.
//!
//! A [`Comparator`] must be a strict weak ordering: irreflexive, transitive,
//! and consistent for the lifetime of the tree. Breaking that contract is a
//! logic error that can lose or duplicate entries, but never causes undefined
//! behavior.

use core::cmp::Ordering;

/// Orders keys (or borrowed forms of keys) stored in a tree.
pub trait Comparator<Q: ?Sized> {
    /// Compares two keys.
    fn compare(&self, lhs: &Q, rhs: &Q) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<Q: ?Sized + Ord> Comparator<Q> for Natural {
    #[inline]
    fn compare(&self, lhs: &Q, rhs: &Q) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
///
/// ```
/// use bstree::{BSTreeMap, Descending};
///
/// let mut map = BSTreeMap::with_comparator(Descending);
/// map.insert(1, ()).unwrap();
/// map.insert(3, ()).unwrap();
/// map.insert(2, ()).unwrap();
/// assert!(map.keys().copied().eq([3, 2, 1]));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Descending;

impl<Q: ?Sized + Ord> Comparator<Q> for Descending {
    #[inline]
    fn compare(&self, lhs: &Q, rhs: &Q) -> Ordering {
        rhs.cmp(lhs)
    }
}

/// Adapts a closure into a [`Comparator`].
///
/// ```
/// use bstree::{BSTreeMap, ByFn};
///
/// let mut map = BSTreeMap::with_comparator(ByFn(|a: &&str, b: &&str| a.len().cmp(&b.len())));
/// map.insert("ccc", 3).unwrap();
/// map.insert("a", 1).unwrap();
/// map.insert("bb", 2).unwrap();
/// assert!(map.values().copied().eq([1, 2, 3]));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ByFn<F>(pub F);

impl<Q: ?Sized, F> Comparator<Q> for ByFn<F>
where
    F: Fn(&Q, &Q) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &Q, rhs: &Q) -> Ordering {
        (self.0)(lhs, rhs)
    }
}
