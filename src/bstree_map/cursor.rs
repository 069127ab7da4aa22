use core::fmt;
use core::marker::PhantomData;

use super::{Structure, erase_and_advance};
use crate::allocator::{Global, NodeAllocator};
use crate::error::{Error, Result};
use crate::order::{InOrder, Order, Reversed};
use crate::policy::{Plain, Policy};
use crate::raw::Handle;

/// A read-only position in a traversal of a [`BSTreeMap`](crate::BSTreeMap).
///
/// A cursor points either at an entry or at the end position, which sits past
/// the last entry of the order `O`. Its state is a single node handle; copying a
/// cursor copies the whole traversal state.
///
/// # Examples
///
/// ```
/// use bstree::{BSTreeMap, Error, PreOrder};
///
/// let map = BSTreeMap::from([(10, "a"), (5, "b"), (15, "c")]);
/// let mut cursor = map.cursor_first::<PreOrder>();
/// assert_eq!(cursor.get(), Ok((&10, &"a")));
/// assert_eq!(cursor.depth(), Some(0));
///
/// cursor.move_next().unwrap();
/// assert_eq!(cursor.key(), Ok(&5));
/// assert_eq!(cursor.depth(), Some(1));
///
/// cursor.move_next().unwrap();
/// cursor.move_next().unwrap();
/// assert!(cursor.is_end());
/// assert_eq!(cursor.get(), Err(Error::OutOfRange));
/// ```
pub struct Cursor<'a, K, V, O = InOrder, A = Global> {
    tree: &'a Structure<K, V, A>,
    current: Option<Handle>,
    _order: PhantomData<O>,
}

/// A position in a traversal of a [`BSTreeMap`](crate::BSTreeMap) with mutable
/// access to values.
///
/// Behaves like [`Cursor`], and an in-order `CursorMut` can also erase the entry
/// it points at with [`remove_current`](CursorMut::remove_current).
pub struct CursorMut<'a, K, V, O = InOrder, P = Plain, A = Global> {
    tree: &'a mut Structure<K, V, A>,
    current: Option<Handle>,
    _marker: PhantomData<(O, fn() -> P)>,
}

/// Steps `current` forward; the end position has no successor.
fn step_next<K, V, O: Order, A>(tree: &Structure<K, V, A>, current: Option<Handle>) -> Result<Option<Handle>> {
    match current {
        Some(node) => Ok(O::next(tree, node)),
        None => Err(Error::OutOfRange),
    }
}

/// Steps `current` backward; the end position steps back onto the last entry.
fn step_prev<K, V, O: Order, A>(tree: &Structure<K, V, A>, current: Option<Handle>) -> Result<Option<Handle>> {
    match current {
        Some(node) => O::prev(tree, node).map(Some).ok_or(Error::OutOfRange),
        None => O::last(tree).map(Some).ok_or(Error::OutOfRange),
    }
}

impl<'a, K, V, O: Order, A> Cursor<'a, K, V, O, A> {
    pub(crate) fn new(tree: &'a Structure<K, V, A>, current: Option<Handle>) -> Self {
        Self {
            tree,
            current,
            _order: PhantomData,
        }
    }

    /// Returns the handle of the current node, or `None` at the end position.
    #[must_use]
    pub fn handle(&self) -> Option<Handle> {
        self.current
    }

    /// Returns true if the cursor is at the end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the current entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn get(&self) -> Result<(&'a K, &'a V)> {
        let node = self.current.ok_or(Error::OutOfRange)?;
        let raw = self.tree.raw();
        Ok((raw.key(node), raw.value(node)))
    }

    /// Returns the current key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn key(&self) -> Result<&'a K> {
        self.get().map(|(key, _)| key)
    }

    /// Returns the current value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn value(&self) -> Result<&'a V> {
        self.get().map(|(_, value)| value)
    }

    /// Returns the number of parent hops from the current node to the root,
    /// or `None` at the end position.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.current.map(|node| self.tree.raw().depth(node))
    }

    /// Advances to the next position. Advancing from the last entry reaches the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the cursor is already at the end.
    pub fn move_next(&mut self) -> Result<()> {
        self.current = step_next::<K, V, O, A>(self.tree, self.current)?;
        Ok(())
    }

    /// Moves to the previous position. Moving back from the end reaches the last entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the first entry, or at the end of an
    /// empty tree. The cursor is left where it was.
    pub fn move_prev(&mut self) -> Result<()> {
        self.current = step_prev::<K, V, O, A>(self.tree, self.current)?;
        Ok(())
    }

    /// Converts into a cursor over the reversed order, at the same position.
    #[must_use]
    pub fn reversed(self) -> Cursor<'a, K, V, Reversed<O>, A> {
        Cursor::new(self.tree, self.current)
    }
}

impl<K, V, O, A> Clone for Cursor<'_, K, V, O, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, O, A> Copy for Cursor<'_, K, V, O, A> {}

impl<K, V, O, A> PartialEq for Cursor<'_, K, V, O, A> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<K, V, O, A> Eq for Cursor<'_, K, V, O, A> {}

impl<K: fmt::Debug, V: fmt::Debug, O: Order, A> fmt::Debug for Cursor<'_, K, V, O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get().ok()).finish()
    }
}

impl<'a, K, V, O: Order, P, A> CursorMut<'a, K, V, O, P, A> {
    pub(crate) fn new(tree: &'a mut Structure<K, V, A>, current: Option<Handle>) -> Self {
        Self {
            tree,
            current,
            _marker: PhantomData,
        }
    }

    /// Returns the handle of the current node, or `None` at the end position.
    #[must_use]
    pub fn handle(&self) -> Option<Handle> {
        self.current
    }

    /// Returns true if the cursor is at the end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the current entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn get(&self) -> Result<(&K, &V)> {
        let node = self.current.ok_or(Error::OutOfRange)?;
        let raw = self.tree.raw();
        Ok((raw.key(node), raw.value(node)))
    }

    /// Returns the current key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn key(&self) -> Result<&K> {
        self.get().map(|(key, _)| key)
    }

    /// Returns the current entry with a mutable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn get_mut(&mut self) -> Result<(&K, &mut V)> {
        let node = self.current.ok_or(Error::OutOfRange)?;
        Ok(self.tree.raw_mut().entry_mut(node))
    }

    /// Returns the current value mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn value_mut(&mut self) -> Result<&mut V> {
        self.get_mut().map(|(_, value)| value)
    }

    /// Converts into a mutable reference to the current value, borrowed from the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    pub fn into_value_mut(self) -> Result<&'a mut V> {
        let node = self.current.ok_or(Error::OutOfRange)?;
        let tree = self.tree;
        Ok(tree.raw_mut().value_mut(node))
    }

    /// Returns the number of parent hops from the current node to the root,
    /// or `None` at the end position.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.current.map(|node| self.tree.raw().depth(node))
    }

    /// Advances to the next position. Advancing from the last entry reaches the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the cursor is already at the end.
    pub fn move_next(&mut self) -> Result<()> {
        self.current = step_next::<K, V, O, A>(self.tree, self.current)?;
        Ok(())
    }

    /// Moves to the previous position. Moving back from the end reaches the last entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the first entry, or at the end of an
    /// empty tree. The cursor is left where it was.
    pub fn move_prev(&mut self) -> Result<()> {
        self.current = step_prev::<K, V, O, A>(self.tree, self.current)?;
        Ok(())
    }

    /// Returns a read-only cursor at the same position.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, K, V, O, A> {
        Cursor::new(self.tree, self.current)
    }

    /// Converts into a cursor over the reversed order, at the same position.
    #[must_use]
    pub fn reversed(self) -> CursorMut<'a, K, V, Reversed<O>, P, A> {
        CursorMut::new(self.tree, self.current)
    }
}

impl<K, V, P: Policy<K, V>, A: NodeAllocator> CursorMut<'_, K, V, InOrder, P, A> {
    /// Erases the current entry and moves to the entry that followed it.
    ///
    /// When the erased node had two children its in-order successor's entry is
    /// moved into it, so the cursor stays on the same node, which now holds the
    /// next key. Otherwise the cursor moves to the successor's node (or the end).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] at the end position.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstree::BSTreeMap;
    ///
    /// let mut map = BSTreeMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);
    /// let mut cursor = map.find_mut(&2);
    /// assert_eq!(cursor.remove_current(), Ok((2, 'b')));
    /// assert_eq!(cursor.key(), Ok(&3));
    /// assert!(map.keys().copied().eq([1, 3]));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(height)
    pub fn remove_current(&mut self) -> Result<(K, V)> {
        let node = self.current.ok_or(Error::OutOfRange)?;
        let (removed, next) = erase_and_advance::<K, V, P, A>(self.tree, node);
        self.current = next;
        Ok((removed.key, removed.value))
    }
}

impl<K: fmt::Debug, V: fmt::Debug, O: Order, P, A> fmt::Debug for CursorMut<'_, K, V, O, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get().ok()).finish()
    }
}
