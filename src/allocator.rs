//! Node allocation policies.
//!
//! The node store constructs and destroys nodes in place inside its arena; a
//! [`NodeAllocator`] only decides whether storage for new nodes may be handed
//! out. Every successful [`allocate`](NodeAllocator::allocate) is balanced by a
//! later [`deallocate`](NodeAllocator::deallocate) when the node is erased, the
//! tree is cleared, drained or dropped.
//!
//! Cloning a tree clones its allocator and charges the clone for every copied
//! node. An allocator whose clones share one pool therefore sees the copy, and
//! one whose clones are independent starts the copy with its own budget.

use crate::error::{Error, Result};

/// Grants or refuses storage for tree nodes.
///
/// An allocator must never pretend to succeed: when it cannot provide storage
/// it returns [`Error::AllocationFailed`], and the tree leaves itself
/// unmodified.
pub trait NodeAllocator {
    /// Requests storage for `count` additional live nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage cannot be provided.
    fn allocate(&mut self, count: usize) -> Result<()>;

    /// Returns storage for `count` nodes that have been destroyed.
    fn deallocate(&mut self, count: usize);
}

/// The default allocator: storage comes from the global heap.
///
/// Arena growth still goes through `Vec::try_reserve`, so heap exhaustion is
/// reported as [`Error::AllocationFailed`] by the node store itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

impl NodeAllocator for Global {
    #[inline]
    fn allocate(&mut self, _count: usize) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn deallocate(&mut self, _count: usize) {}
}

/// An allocator with a fixed budget of live nodes.
///
/// # Examples
///
/// ```
/// use bstree::{BSTreeMap, Bounded, Error};
///
/// let mut map = BSTreeMap::with_allocator(Bounded::new(2));
/// map.insert(1, "a").unwrap();
/// map.insert(2, "b").unwrap();
/// assert_eq!(map.insert(3, "c").err(), Some(Error::AllocationFailed));
/// assert_eq!(map.len(), 2);
///
/// map.remove(&1);
/// assert!(map.insert(3, "c").is_ok());
/// ```
///
/// A clone has the same limit and nothing in use, so a cloned map is charged
/// against a budget of its own.
#[derive(Debug, PartialEq, Eq)]
pub struct Bounded {
    limit: usize,
    in_use: usize,
}

impl Bounded {
    /// Creates an allocator that allows at most `limit` live nodes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit, in_use: 0 }
    }

    /// Returns the maximum number of live nodes.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of nodes currently allocated.
    #[must_use]
    pub const fn in_use(&self) -> usize {
        self.in_use
    }

    /// Returns how many more nodes may be allocated.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.limit - self.in_use
    }
}

impl Clone for Bounded {
    fn clone(&self) -> Self {
        Self::new(self.limit)
    }
}

impl NodeAllocator for Bounded {
    fn allocate(&mut self, count: usize) -> Result<()> {
        if count > self.remaining() {
            log::warn!(
                "node budget exhausted: {} of {} in use, {} requested",
                self.in_use,
                self.limit,
                count
            );
            return Err(Error::AllocationFailed);
        }
        self.in_use += count;
        Ok(())
    }

    fn deallocate(&mut self, count: usize) {
        debug_assert!(count <= self.in_use, "`Bounded::deallocate()` - more nodes returned than allocated!");
        self.in_use = self.in_use.saturating_sub(count);
    }
}
